//! Property-based tests for floraledger-core.
//!
//! Run with: cargo test -p floraledger-core --test `property_tests`

use chrono::{NaiveDate, NaiveDateTime};
use floraledger_core::{Money, MovementDraft, MovementId, MovementKind, ValidationError};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_decimal() -> impl Strategy<Value = Decimal> {
    // Up to four places so rounding actually happens
    (-10_000_000i64..10_000_000i64).prop_map(|n| Decimal::new(n, 4))
}

fn arb_kind() -> impl Strategy<Value = MovementKind> {
    prop_oneof![
        Just(MovementKind::Load),
        Just(MovementKind::Unload),
        Just(MovementKind::Destroy),
    ]
}

fn arb_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (1u32..13u32, 1u32..29u32, 0u32..24u32).prop_map(|(m, d, h)| {
        NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    })
}

// ============================================================================
// Money Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Rounding to cents moves a value by at most half a cent
    #[test]
    fn prop_money_rounding_is_within_half_cent(d in arb_decimal()) {
        let m = Money::from_decimal(d).unwrap();
        prop_assert!((m.to_decimal() - d).abs() <= Decimal::new(5, 3));
    }

    /// Converting an already-rounded amount is lossless
    #[test]
    fn prop_money_decimal_roundtrip(cents in -1_000_000_000i64..1_000_000_000i64) {
        let m = Money::from_cents(cents);
        prop_assert_eq!(Money::from_decimal(m.to_decimal()), Some(m));
        prop_assert_eq!(m.to_string().parse::<Money>(), Ok(m));
    }

    /// Tolerance comparison is symmetric
    #[test]
    fn prop_money_is_near_symmetric(
        a in -100_000i64..100_000i64,
        b in -100_000i64..100_000i64,
        tol in 0i64..50i64
    ) {
        let (a, b, tol) = (Money::from_cents(a), Money::from_cents(b), Money::from_cents(tol));
        prop_assert_eq!(a.is_near(b, tol), b.is_near(a, tol));
    }
}

// ============================================================================
// Validation Properties
// ============================================================================

proptest! {
    /// Every accepted movement has a positive quantity and package size,
    /// and loads always carry a cost
    #[test]
    fn prop_validated_movements_are_well_formed(
        kind in arb_kind(),
        quantity in -50i64..500i64,
        package in -5i64..50i64,
        cost in prop::option::of(0i64..100_000i64),
        at in arb_datetime()
    ) {
        let mut draft = MovementDraft::new("rosa", kind, quantity, package, at);
        if let Some(c) = cost {
            draft = draft.with_unit_cost(Decimal::new(c, 2));
        }
        match draft.validate(MovementId(1)) {
            Ok(m) => {
                prop_assert!(m.quantity > 0);
                prop_assert!(m.package_size > 0);
                if m.kind == MovementKind::Load {
                    prop_assert!(m.unit_cost.is_some());
                }
            }
            Err(ValidationError::NonPositiveQuantity(q)) => prop_assert!(q <= 0),
            Err(ValidationError::NonPositivePackageSize(p)) => prop_assert!(p <= 0),
            Err(ValidationError::MissingUnitCost) => {
                prop_assert_eq!(kind, MovementKind::Load);
                prop_assert!(cost.is_none());
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}
