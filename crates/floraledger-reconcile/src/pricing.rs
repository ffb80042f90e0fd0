//! Default sale price derived from acquisition cost.

use floraledger_core::Money;
use rust_decimal::Decimal;

/// System-wide markup: sale price is cost plus 60%.
pub const DEFAULT_MARKUP: Decimal = Decimal::from_parts(16, 0, 0, false, 1);

/// Default sale price for a unit cost using [`DEFAULT_MARKUP`].
///
/// ```
/// use floraledger_core::Money;
/// use floraledger_reconcile::default_sale_price;
///
/// assert_eq!(default_sale_price(Money::from_cents(1000)), Money::from_cents(1600));
/// ```
#[must_use]
pub fn default_sale_price(unit_cost: Money) -> Money {
    sale_price_with_markup(unit_cost, DEFAULT_MARKUP)
}

/// Sale price for a unit cost with a custom markup, rounded to cents.
#[must_use]
pub fn sale_price_with_markup(unit_cost: Money, markup: Decimal) -> Money {
    unit_cost.scale(markup)
}
