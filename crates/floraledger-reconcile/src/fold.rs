//! The reconciliation fold: movements in, one aggregate per lot out.
//!
//! Movements are replayed per variant in `(occurred_at, id)` order. Loads add
//! to the lot their key names; reductions resolve their [`LotTarget`] against
//! the lots seen so far and subtract, never taking a lot below zero. Whatever
//! a reduction could not take is reported and dropped.

use chrono::NaiveDateTime;
use floraledger_core::{LotKey, Money, Movement, MovementId, MovementKind, SupplierId, VariantId};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::key::{derive_key, LotTarget, ReductionPolicy};

/// Options for [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Two costs closer than this are the same cost.
    pub cost_tolerance: Money,
    /// How reductions without an exact lot are resolved.
    pub reduction_policy: ReductionPolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            cost_tolerance: Money::CENT,
            reduction_policy: ReductionPolicy::Fifo,
        }
    }
}

/// The folded state of one lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotAggregate {
    /// Lot identity, as first seen.
    pub key: LotKey,
    /// Stock left after every movement was applied.
    pub quantity: u64,
    /// Time of the last load.
    pub acquisition_date: NaiveDateTime,
    /// Supplier of the last load.
    pub supplier_id: Option<SupplierId>,
    /// Most recent explicit sale price supplied with a load.
    pub sale_price: Option<Money>,
    /// Time of the load that opened the lot; FIFO consumes by this.
    pub opened_at: NaiveDateTime,
    /// Movement that opened the lot.
    pub opened_by: MovementId,
}

impl LotAggregate {
    /// Whether the lot ended with no stock.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    fn open(key: LotKey, movement: &Movement) -> Self {
        Self {
            key,
            quantity: 0,
            acquisition_date: movement.occurred_at,
            supplier_id: None,
            sale_price: None,
            opened_at: movement.occurred_at,
            opened_by: movement.id,
        }
    }
}

/// Output of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// One aggregate per lot ever loaded, empty ones included.
    pub aggregates: BTreeMap<LotKey, LotAggregate>,
    /// Reductions that were skipped or clamped.
    pub diagnostics: Vec<Diagnostic>,
}

impl Reconciliation {
    /// Aggregates that still hold stock.
    pub fn non_empty(&self) -> impl Iterator<Item = &LotAggregate> {
        self.aggregates.values().filter(|a| !a.is_empty())
    }

    /// Total stock of a variant across its lots.
    #[must_use]
    pub fn variant_quantity(&self, variant_id: &VariantId) -> u64 {
        self.aggregates
            .values()
            .filter(|a| a.key.variant_id == *variant_id)
            .map(|a| a.quantity)
            .sum()
    }
}

/// Error that aborts a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A movement that validation should have rejected reached the fold.
    #[error("invariant violation in movement {movement}: {reason}")]
    InvariantViolation {
        /// The offending movement.
        movement: MovementId,
        /// What is wrong with it.
        reason: String,
    },
}

/// Fold the movement log into lot aggregates.
///
/// The whole log is checked first; a single malformed movement fails the run
/// so that no partial result is ever merged.
///
/// # Examples
///
/// ```
/// use floraledger_core::{MovementDraft, MovementId};
/// use floraledger_reconcile::{reconcile, ReconcileOptions};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let movements = vec![
///     MovementDraft::load("rosa", 50, dec!(2.50), 10, at).with_invoice("FT-1")
///         .validate(MovementId(1)).unwrap(),
///     MovementDraft::unload("rosa", 20, 10, at).with_invoice("FT-1")
///         .validate(MovementId(2)).unwrap(),
/// ];
///
/// let result = reconcile(&movements, &ReconcileOptions::default()).unwrap();
/// assert_eq!(result.variant_quantity(&"rosa".into()), 30);
/// ```
pub fn reconcile(
    movements: &[Movement],
    options: &ReconcileOptions,
) -> Result<Reconciliation, ReconcileError> {
    check_invariants(movements)?;

    let mut by_variant: BTreeMap<&VariantId, Vec<&Movement>> = BTreeMap::new();
    for movement in movements {
        by_variant
            .entry(&movement.variant_id)
            .or_default()
            .push(movement);
    }

    let mut result = Reconciliation::default();
    for (variant_id, mut group) in by_variant {
        group.sort_by_key(|m| m.sequence_key());

        let mut replay = VariantReplay::new(options);
        for movement in group {
            replay.apply(movement, &mut result.diagnostics);
        }

        debug!(
            variant = variant_id.as_str(),
            lots = replay.lots.len(),
            "variant replayed"
        );
        for aggregate in replay.lots {
            result.aggregates.insert(aggregate.key.clone(), aggregate);
        }
    }

    for diagnostic in &result.diagnostics {
        diagnostic.trace();
    }
    debug!(
        movements = movements.len(),
        lots = result.aggregates.len(),
        diagnostics = result.diagnostics.len(),
        "reconciliation finished"
    );

    Ok(result)
}

fn check_invariants(movements: &[Movement]) -> Result<(), ReconcileError> {
    let mut seen = HashSet::with_capacity(movements.len());
    for movement in movements {
        let violation = |reason: &str| ReconcileError::InvariantViolation {
            movement: movement.id,
            reason: reason.to_string(),
        };

        if !seen.insert(movement.id) {
            return Err(violation("duplicate movement id"));
        }
        if movement.quantity == 0 {
            return Err(violation("quantity is zero"));
        }
        if movement.package_size == 0 {
            return Err(violation("package size is zero"));
        }
        match movement.unit_cost {
            None if movement.kind == MovementKind::Load => {
                return Err(violation("load without unit cost"));
            }
            Some(cost) if cost.is_negative() => {
                return Err(violation("negative unit cost"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Running lot state for one variant.
struct VariantReplay<'a> {
    options: &'a ReconcileOptions,
    lots: Vec<LotAggregate>,
}

impl<'a> VariantReplay<'a> {
    const fn new(options: &'a ReconcileOptions) -> Self {
        Self {
            options,
            lots: Vec::new(),
        }
    }

    fn apply(&mut self, movement: &Movement, diagnostics: &mut Vec<Diagnostic>) {
        match derive_key(movement) {
            LotTarget::Exact(key) if movement.kind == MovementKind::Load => {
                self.load(movement, key);
            }
            target => self.reduce(movement, &target, diagnostics),
        }
    }

    fn load(&mut self, movement: &Movement, key: LotKey) {
        let tolerance = self.options.cost_tolerance;
        let idx = match self.lots.iter().position(|l| l.key.matches(&key, tolerance)) {
            Some(idx) => idx,
            None => {
                self.lots.push(LotAggregate::open(key, movement));
                self.lots.len() - 1
            }
        };

        let lot = &mut self.lots[idx];
        lot.quantity = lot.quantity.saturating_add(u64::from(movement.quantity));
        lot.acquisition_date = movement.occurred_at;
        lot.supplier_id.clone_from(&movement.supplier_id);
        if movement.sale_price.is_some() {
            lot.sale_price = movement.sale_price;
        }
    }

    /// Indices of lots admitted by `target` that still hold stock, oldest first.
    fn candidates(&self, target: &LotTarget) -> Vec<usize> {
        let tolerance = self.options.cost_tolerance;
        let mut indices: Vec<usize> = self
            .lots
            .iter()
            .enumerate()
            .filter(|(_, l)| l.quantity > 0 && target.admits(&l.key, tolerance))
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| (self.lots[i].opened_at, self.lots[i].opened_by));
        indices
    }

    fn reduce(
        &mut self,
        movement: &Movement,
        target: &LotTarget,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let scope = match self.options.reduction_policy {
            ReductionPolicy::Fifo => target.fallback(),
            ReductionPolicy::Strict => target.clone(),
        };

        let order = match self.options.reduction_policy {
            ReductionPolicy::Fifo => {
                // The named lot first, then the rest of its cohort.
                let mut order = target
                    .exact()
                    .map(|key| self.candidates(&LotTarget::Exact(key.clone())))
                    .unwrap_or_default();
                for idx in self.candidates(&scope) {
                    if !order.contains(&idx) {
                        order.push(idx);
                    }
                }
                order
            }
            ReductionPolicy::Strict => {
                let candidates = self.candidates(&scope);
                if candidates.len() > 1 {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::AmbiguousReduction,
                            format!(
                                "{} {} matches {} lots ({target}), skipped",
                                movement.kind,
                                movement.id,
                                candidates.len()
                            ),
                        )
                        .with_variant(&movement.variant_id)
                        .with_movement(movement.id),
                    );
                    return;
                }
                candidates
            }
        };

        if order.is_empty() {
            let tolerance = self.options.cost_tolerance;
            let known = self.lots.iter().any(|l| scope.admits(&l.key, tolerance));
            let (code, message) = if known {
                (
                    DiagnosticCode::NegativeStockClamped,
                    format!(
                        "{} {} of {} finds {target} out of stock, clamped at zero",
                        movement.kind, movement.id, movement.quantity
                    ),
                )
            } else {
                (
                    DiagnosticCode::UnmatchedReduction,
                    format!(
                        "{} {} of {} matches no loaded lot ({target}), skipped",
                        movement.kind, movement.id, movement.quantity
                    ),
                )
            };
            diagnostics.push(
                Diagnostic::new(code, message)
                    .with_variant(&movement.variant_id)
                    .with_movement(movement.id),
            );
            return;
        }

        let mut remaining = u64::from(movement.quantity);
        for idx in order {
            if remaining == 0 {
                break;
            }
            let lot = &mut self.lots[idx];
            let take = remaining.min(lot.quantity);
            lot.quantity -= take;
            remaining -= take;
        }

        if remaining > 0 {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::NegativeStockClamped,
                    format!(
                        "{} {} of {} exceeds stock of {target} by {remaining}, clamped at zero",
                        movement.kind, movement.id, movement.quantity
                    ),
                )
                .with_variant(&movement.variant_id)
                .with_movement(movement.id),
            );
        }
    }
}
