//! Merge folded aggregates into the persisted lot store.
//!
//! Lots that still hold stock keep their id; lots that emptied or vanished
//! are dropped; newly seen lots get the next id from a [`LotIdSequence`].

use floraledger_core::{Lot, LotId, LotKey, Money, SalePrice, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::fold::LotAggregate;
use crate::pricing::{sale_price_with_markup, DEFAULT_MARKUP};

/// Options for [`merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Two costs closer than this are the same cost.
    pub cost_tolerance: Money,
    /// Markup used to derive the sale price of new lots.
    pub markup: Decimal,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            cost_tolerance: Money::CENT,
            markup: DEFAULT_MARKUP,
        }
    }
}

/// Source of fresh lot ids.
///
/// Persisted alongside the lots so that ids of deleted lots are never
/// handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotIdSequence {
    next: u64,
}

impl Default for LotIdSequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl LotIdSequence {
    /// Start handing out ids at `next`.
    #[must_use]
    pub const fn new(next: u64) -> Self {
        Self { next }
    }

    /// The id the next call to [`LotIdSequence::next_id`] returns.
    #[must_use]
    pub const fn peek(&self) -> LotId {
        LotId(self.next)
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> LotId {
        let id = LotId(self.next);
        self.next += 1;
        id
    }

    /// Make sure no id at or below those of `lots` is handed out.
    pub fn skip_past(&mut self, lots: &[Lot]) {
        if let Some(max) = lots.iter().map(|l| l.id.0).max() {
            self.next = self.next.max(max + 1);
        }
    }
}

/// Upsert aggregates against the previous lot set.
///
/// - A non-empty aggregate updates the lowest-id previous lot whose key
///   matches within tolerance, or becomes a new lot. The updated lot keeps
///   its id but takes the aggregate's key, so persisted keys stay exactly
///   as far apart as the fold kept them.
/// - Previous lots left without a non-empty aggregate are dropped.
/// - An explicit sale price is never replaced. A derived price is replaced
///   only by an explicit one supplied with a load.
///
/// The result is sorted by id. Merging the same aggregates twice gives the
/// same lots and mints no ids the second time.
pub fn merge(
    previous: &[Lot],
    aggregates: &BTreeMap<LotKey, LotAggregate>,
    ids: &mut LotIdSequence,
    options: &MergeOptions,
) -> Vec<Lot> {
    ids.skip_past(previous);

    let mut previous: Vec<&Lot> = previous.iter().collect();
    previous.sort_by_key(|l| l.id);
    let mut claimed = vec![false; previous.len()];

    let mut lots = Vec::with_capacity(aggregates.len());
    let mut created = 0usize;

    for aggregate in aggregates.values().filter(|a| !a.is_empty()) {
        let existing = previous.iter().enumerate().position(|(i, l)| {
            !claimed[i] && l.key.matches(&aggregate.key, options.cost_tolerance)
        });

        let lot = if let Some(idx) = existing {
            claimed[idx] = true;
            update(previous[idx], aggregate)
        } else {
            created += 1;
            create(ids.next_id(), aggregate, options.markup)
        };
        lots.push(lot);
    }

    lots.sort_by_key(|l| l.id);
    debug!(
        previous = previous.len(),
        merged = lots.len(),
        created,
        dropped = claimed.iter().filter(|c| !**c).count(),
        "lots merged"
    );
    lots
}

fn update(previous: &Lot, aggregate: &LotAggregate) -> Lot {
    let sale_price = match (previous.sale_price, aggregate.sale_price) {
        (SalePrice::Explicit(price), _) => SalePrice::Explicit(price),
        (SalePrice::Derived(_), Some(price)) => SalePrice::Explicit(price),
        (derived, None) => derived,
    };

    Lot {
        id: previous.id,
        key: aggregate.key.clone(),
        quantity: aggregate.quantity,
        acquisition_date: aggregate.acquisition_date,
        supplier_id: aggregate.supplier_id.clone(),
        sale_price,
    }
}

fn create(id: LotId, aggregate: &LotAggregate, markup: Decimal) -> Lot {
    let sale_price = aggregate.sale_price.map_or_else(
        || SalePrice::Derived(sale_price_with_markup(aggregate.key.unit_cost, markup)),
        SalePrice::Explicit,
    );

    Lot {
        id,
        key: aggregate.key.clone(),
        quantity: aggregate.quantity,
        acquisition_date: aggregate.acquisition_date,
        supplier_id: aggregate.supplier_id.clone(),
        sale_price,
    }
}

/// Variants whose lots differ between two lot sets.
#[must_use]
pub fn changed_variants(before: &[Lot], after: &[Lot]) -> BTreeSet<VariantId> {
    let index = |lots: &[Lot]| -> BTreeMap<LotId, Lot> {
        lots.iter().map(|l| (l.id, l.clone())).collect()
    };
    let (before, after) = (index(before), index(after));

    let mut changed = BTreeSet::new();
    for (id, lot) in &before {
        if after.get(id) != Some(lot) {
            changed.insert(lot.variant_id().clone());
        }
    }
    for (id, lot) in &after {
        if before.get(id) != Some(lot) {
            changed.insert(lot.variant_id().clone());
        }
    }
    changed
}
