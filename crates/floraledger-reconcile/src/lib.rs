//! Stock reconciliation engine.
//!
//! This crate derives the persisted lot set from the movement log:
//!
//! - Lot key derivation ([`derive_key`])
//! - The reconciliation fold ([`reconcile`])
//! - The lot store merge ([`merge`])
//! - The dedup sweep ([`dedup`])
//! - Derived pricing ([`default_sale_price`])
//!
//! Everything here is a pure function over plain records. Loading and saving
//! the records, and telling anyone that they changed, is the caller's job.
//!
//! # Pipeline
//!
//! ```
//! use floraledger_core::{MovementDraft, MovementId, Money, SalePrice};
//! use floraledger_reconcile::{recompute, EngineOptions, LotIdSequence};
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! let movements = vec![
//!     MovementDraft::load("rosa", 50, dec!(2.50), 10, at).with_invoice("FT-1")
//!         .validate(MovementId(1)).unwrap(),
//! ];
//!
//! let mut ids = LotIdSequence::default();
//! let outcome = recompute(&[], &movements, &mut ids, &EngineOptions::default()).unwrap();
//!
//! assert_eq!(outcome.lots.len(), 1);
//! assert_eq!(outcome.lots[0].quantity, 50);
//! assert_eq!(outcome.lots[0].sale_price, SalePrice::Derived(Money::from_cents(400)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dedup;
mod diagnostic;
mod fold;
mod key;
mod merge;
mod pricing;

pub use dedup::{dedup, DedupOptions, DedupOutcome, DedupPolicy, Duplicate};
pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use fold::{reconcile, LotAggregate, ReconcileError, ReconcileOptions, Reconciliation};
pub use key::{derive_key, LotTarget, ReductionPolicy};
pub use merge::{changed_variants, merge, LotIdSequence, MergeOptions};
pub use pricing::{default_sale_price, sale_price_with_markup, DEFAULT_MARKUP};

use floraledger_core::{Lot, Money, Movement};
use rust_decimal::Decimal;

/// Engine-wide settings, split into the per-stage option structs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Two costs closer than this are the same cost.
    pub cost_tolerance: Money,
    /// Markup for derived sale prices.
    pub markup: Decimal,
    /// How reductions without an exact lot are resolved.
    pub reduction_policy: ReductionPolicy,
    /// Fate of duplicate quantities in the dedup sweep.
    pub dedup_policy: DedupPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cost_tolerance: Money::CENT,
            markup: DEFAULT_MARKUP,
            reduction_policy: ReductionPolicy::default(),
            dedup_policy: DedupPolicy::default(),
        }
    }
}

impl EngineOptions {
    /// Options for the fold.
    #[must_use]
    pub const fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            cost_tolerance: self.cost_tolerance,
            reduction_policy: self.reduction_policy,
        }
    }

    /// Options for the merge.
    #[must_use]
    pub const fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            cost_tolerance: self.cost_tolerance,
            markup: self.markup,
        }
    }

    /// Options for the dedup sweep.
    #[must_use]
    pub const fn dedup_options(&self) -> DedupOptions {
        DedupOptions {
            cost_tolerance: self.cost_tolerance,
            policy: self.dedup_policy,
        }
    }
}

/// Result of [`recompute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recompute {
    /// The new lot set, sorted by id.
    pub lots: Vec<Lot>,
    /// Diagnostics from the fold.
    pub diagnostics: Vec<Diagnostic>,
}

/// Reconcile the full movement log and merge the result into `previous`.
///
/// Either the whole new lot set is returned or an error is, in which case
/// `previous` and `ids` are left as they were.
pub fn recompute(
    previous: &[Lot],
    movements: &[Movement],
    ids: &mut LotIdSequence,
    options: &EngineOptions,
) -> Result<Recompute, ReconcileError> {
    let reconciliation = reconcile(movements, &options.reconcile_options())?;
    let lots = merge(
        previous,
        &reconciliation.aggregates,
        ids,
        &options.merge_options(),
    );
    Ok(Recompute {
        lots,
        diagnostics: reconciliation.diagnostics,
    })
}
