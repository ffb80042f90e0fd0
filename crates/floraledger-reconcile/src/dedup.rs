//! Dedup sweep over persisted lots.
//!
//! Two lot records with the same key should never coexist; they appear after
//! a partial write or when two writers race on the store file. The sweep
//! groups lots by key (cost within tolerance), keeps the lowest id of each
//! group as the canonical record and removes the others.

use floraledger_core::{Lot, LotId, Money};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticCode};

/// What happens to the quantity of a discarded duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DedupPolicy {
    /// Duplicates are copies of the same stock: drop them, keep the
    /// canonical quantity unchanged.
    #[default]
    KeepCanonical,
    /// Duplicates are independent stock: add their quantity to the
    /// canonical lot before dropping them.
    Sum,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "KEEP_CANONICAL" | "KEEP" => Ok(Self::KeepCanonical),
            "SUM" => Ok(Self::Sum),
            _ => Err(format!("unknown dedup policy: {s}")),
        }
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepCanonical => write!(f, "KEEP_CANONICAL"),
            Self::Sum => write!(f, "SUM"),
        }
    }
}

/// Options for [`dedup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOptions {
    /// Two costs closer than this are the same cost.
    pub cost_tolerance: Money,
    /// Fate of duplicate quantities.
    pub policy: DedupPolicy,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            cost_tolerance: Money::CENT,
            policy: DedupPolicy::KeepCanonical,
        }
    }
}

/// A lot record the sweep folded into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duplicate {
    /// The removed record.
    pub id: LotId,
    /// The surviving record of its group.
    pub canonical: LotId,
    /// Quantity the removed record held.
    pub quantity: u64,
}

/// Result of a dedup sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    /// Surviving lots, sorted by id.
    pub lots: Vec<Lot>,
    /// Ids of the removed duplicates.
    pub removed: Vec<LotId>,
    /// Where each removed duplicate went, in removal order.
    pub duplicates: Vec<Duplicate>,
    /// One diagnostic per removed duplicate.
    pub diagnostics: Vec<Diagnostic>,
}

/// Collapse lots that share a key.
///
/// Each lot, in id order, joins the first group whose canonical lot it
/// matches, or starts a new group. Running the sweep on its own output
/// changes nothing.
///
/// Under [`DedupPolicy::Sum`] the returned canonical quantities include the
/// duplicates, but nothing in the movement log backs them yet; a caller
/// that persists the result must also record [`DedupOutcome::duplicates`]
/// as movements or the next reconciliation takes the stock back.
///
/// # Examples
///
/// ```
/// use floraledger_core::{Lot, LotId, LotKey, Money, SalePrice, NaiveDate};
/// use floraledger_reconcile::{dedup, DedupOptions};
///
/// let lot = Lot {
///     id: LotId(1),
///     key: LotKey::new("rosa", Some("FT-1".into()), Money::from_cents(250), 10),
///     quantity: 30,
///     acquisition_date: NaiveDate::from_ymd_opt(2024, 3, 1)
///         .unwrap()
///         .and_hms_opt(8, 0, 0)
///         .unwrap(),
///     supplier_id: None,
///     sale_price: SalePrice::Derived(Money::from_cents(400)),
/// };
/// let mut copy = lot.clone();
/// copy.id = LotId(4);
///
/// let outcome = dedup(&[copy, lot], &DedupOptions::default());
/// assert_eq!(outcome.lots.len(), 1);
/// assert_eq!(outcome.lots[0].id, LotId(1));
/// assert_eq!(outcome.lots[0].quantity, 30);
/// assert_eq!(outcome.removed, vec![LotId(4)]);
/// ```
#[must_use]
pub fn dedup(lots: &[Lot], options: &DedupOptions) -> DedupOutcome {
    let mut sorted: Vec<&Lot> = lots.iter().collect();
    sorted.sort_by_key(|l| l.id);

    let mut outcome = DedupOutcome::default();
    for lot in sorted {
        let group = outcome
            .lots
            .iter()
            .position(|c| c.key.matches(&lot.key, options.cost_tolerance));

        let Some(group) = group else {
            outcome.lots.push(lot.clone());
            continue;
        };
        let canonical = &mut outcome.lots[group];
        outcome.duplicates.push(Duplicate {
            id: lot.id,
            canonical: canonical.id,
            quantity: lot.quantity,
        });

        let diagnostic = match options.policy {
            DedupPolicy::KeepCanonical => Diagnostic::new(
                DiagnosticCode::DuplicateLotDiscarded,
                format!(
                    "lot {} duplicates lot {} ({}), discarded with quantity {}",
                    lot.id, canonical.id, canonical.key, lot.quantity
                ),
            ),
            DedupPolicy::Sum => {
                canonical.quantity = canonical.quantity.saturating_add(lot.quantity);
                Diagnostic::new(
                    DiagnosticCode::DuplicateLotSummed,
                    format!(
                        "lot {} duplicates lot {} ({}), quantity {} added",
                        lot.id, canonical.id, canonical.key, lot.quantity
                    ),
                )
            }
        };
        let diagnostic = diagnostic.with_variant(lot.variant_id()).with_lot(lot.id);
        diagnostic.trace();
        outcome.diagnostics.push(diagnostic);
        outcome.removed.push(lot.id);
    }

    debug!(
        lots = lots.len(),
        removed = outcome.removed.len(),
        policy = %options.policy,
        "dedup sweep finished"
    );
    outcome
}
