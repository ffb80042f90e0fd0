//! Property-based tests for the reconciliation engine.
//!
//! Run with: cargo test -p floraledger-reconcile --test `property_tests`

use chrono::{NaiveDate, NaiveDateTime};
use floraledger_core::{LotKey, Money, Movement, MovementDraft, MovementId, MovementKind};
use floraledger_reconcile::{
    dedup, merge, reconcile, DedupOptions, DedupPolicy, EngineOptions, LotIdSequence,
    MergeOptions, ReconcileOptions, ReductionPolicy,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (1u32..29u32, 0u32..24u32).prop_map(|(d, h)| {
        NaiveDate::from_ymd_opt(2024, 2, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    })
}

fn arb_variant() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("rosa".to_string()),
        Just("tulipano".to_string()),
        Just("garofano".to_string()),
    ]
}

fn arb_invoice() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        Just("FT-1".to_string()),
        Just("FT-2".to_string()),
        Just("FT-3".to_string()),
    ])
}

fn arb_cost() -> impl Strategy<Value = Decimal> {
    // A handful of costs, so lots actually collide
    prop_oneof![
        Just(Decimal::new(250, 2)),
        Just(Decimal::new(251, 2)),
        Just(Decimal::new(300, 2)),
        Just(Decimal::new(80, 2)),
    ]
}

fn arb_draft() -> impl Strategy<Value = MovementDraft> {
    (
        arb_variant(),
        prop_oneof![
            3 => Just(MovementKind::Load),
            2 => Just(MovementKind::Unload),
            1 => Just(MovementKind::Destroy),
        ],
        1i64..200i64,
        arb_cost(),
        prop_oneof![Just(10i64), Just(20i64)],
        arb_invoice(),
        prop::bool::ANY,
        arb_datetime(),
    )
        .prop_map(|(variant, kind, qty, cost, package, invoice, with_cost, at)| {
            let mut draft = MovementDraft::new(variant, kind, qty, package, at);
            if kind == MovementKind::Load || with_cost {
                draft = draft.with_unit_cost(cost);
            }
            if let Some(invoice) = invoice {
                draft = draft.with_invoice(invoice);
            }
            draft
        })
}

fn arb_log() -> impl Strategy<Value = Vec<Movement>> {
    prop::collection::vec(arb_draft(), 0..40).prop_map(|drafts| {
        drafts
            .into_iter()
            .enumerate()
            .map(|(i, d)| d.validate(MovementId(i as u64 + 1)).unwrap())
            .collect()
    })
}

fn arb_reconcile_options() -> impl Strategy<Value = ReconcileOptions> {
    (
        prop_oneof![Just(ReductionPolicy::Fifo), Just(ReductionPolicy::Strict)],
        prop_oneof![Just(Money::CENT), Just(Money::from_cents(2))],
    )
        .prop_map(|(reduction_policy, cost_tolerance)| ReconcileOptions {
            cost_tolerance,
            reduction_policy,
        })
}

// ============================================================================
// Fold Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Stock never exceeds what was loaded for the variant
    #[test]
    fn prop_stock_bounded_by_loads(log in arb_log(), options in arb_reconcile_options()) {
        let result = reconcile(&log, &options).unwrap();
        for variant in ["rosa", "tulipano", "garofano"] {
            let loaded: u64 = log
                .iter()
                .filter(|m| m.variant_id == variant && m.kind == MovementKind::Load)
                .map(|m| u64::from(m.quantity))
                .sum();
            prop_assert!(result.variant_quantity(&variant.into()) <= loaded);
        }
    }

    /// Only loads: every lot holds exactly what was loaded into it
    #[test]
    fn prop_conservation_without_reductions(log in arb_log()) {
        let loads: Vec<Movement> = log
            .into_iter()
            .filter(|m| m.kind == MovementKind::Load)
            .collect();
        let result = reconcile(&loads, &ReconcileOptions::default()).unwrap();

        let total_loaded: u64 = loads.iter().map(|m| u64::from(m.quantity)).sum();
        let total_stock: u64 = result.aggregates.values().map(|a| a.quantity).sum();
        prop_assert_eq!(total_loaded, total_stock);

        for (key, aggregate) in &result.aggregates {
            let expected: u64 = loads
                .iter()
                .filter(|m| {
                    let k = LotKey::new(
                        m.variant_id.clone(),
                        m.source_invoice_id.clone(),
                        m.unit_cost.unwrap(),
                        m.package_size,
                    );
                    &k == key
                })
                .map(|m| u64::from(m.quantity))
                .sum();
            prop_assert_eq!(aggregate.quantity, expected);
        }
    }

    /// Storage order does not matter, only (time, id)
    #[test]
    fn prop_reconcile_ignores_storage_order(log in arb_log(), options in arb_reconcile_options()) {
        let mut reversed = log.clone();
        reversed.reverse();
        let a = reconcile(&log, &options).unwrap();
        let b = reconcile(&reversed, &options).unwrap();
        prop_assert_eq!(a.aggregates, b.aggregates);
    }

    /// Reductions never push the variant total above the FIFO bound
    #[test]
    fn prop_reductions_only_lower_stock(log in arb_log()) {
        let loads: Vec<Movement> = log
            .iter()
            .filter(|m| m.kind == MovementKind::Load)
            .cloned()
            .collect();
        let with = reconcile(&log, &ReconcileOptions::default()).unwrap();
        let without = reconcile(&loads, &ReconcileOptions::default()).unwrap();
        for (key, aggregate) in &with.aggregates {
            prop_assert!(aggregate.quantity <= without.aggregates[key].quantity);
        }
    }
}

// ============================================================================
// Merge and Dedup Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// merge(merge(prev, agg), agg) == merge(prev, agg)
    #[test]
    fn prop_merge_idempotent(earlier in arb_log(), later in arb_log()) {
        let options = EngineOptions::default();
        let mut ids = LotIdSequence::default();

        let first = reconcile(&earlier, &options.reconcile_options()).unwrap();
        let previous = merge(&[], &first.aggregates, &mut ids, &options.merge_options());

        let second = reconcile(&later, &options.reconcile_options()).unwrap();
        let once = merge(&previous, &second.aggregates, &mut ids, &MergeOptions::default());
        let next = ids.peek();
        let twice = merge(&once, &second.aggregates, &mut ids, &MergeOptions::default());

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(ids.peek(), next);
        prop_assert!(once.iter().all(|l| l.quantity > 0));
        prop_assert!(once.windows(2).all(|w| w[0].id < w[1].id));
    }

    /// dedup(dedup(lots)) == dedup(lots), for both policies
    #[test]
    fn prop_dedup_converges(log in arb_log(), copies in prop::collection::vec(0usize..40, 0..10)) {
        let options = EngineOptions::default();
        let mut ids = LotIdSequence::default();
        let result = reconcile(&log, &options.reconcile_options()).unwrap();
        let mut lots = merge(&[], &result.aggregates, &mut ids, &options.merge_options());

        // Inject duplicates with fresh ids
        if !lots.is_empty() {
            for c in copies {
                let mut dup = lots[c % lots.len()].clone();
                dup.id = ids.next_id();
                lots.push(dup);
            }
        }

        for policy in [DedupPolicy::KeepCanonical, DedupPolicy::Sum] {
            let options = DedupOptions { policy, ..DedupOptions::default() };
            let once = dedup(&lots, &options);
            let twice = dedup(&once.lots, &options);
            prop_assert_eq!(&once.lots, &twice.lots);
            prop_assert!(twice.removed.is_empty());
            prop_assert_eq!(once.lots.len() + once.removed.len(), lots.len());
        }
    }
}
