//! Warehouse movements.
//!
//! A [`Movement`] is one immutable entry of the append-only stock log. New
//! movements enter as a [`MovementDraft`], which carries the loosely typed
//! values produced by invoice entry, sales checkout and destruction screens,
//! and become a [`Movement`] only after [`MovementDraft::validate`] accepts
//! them.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::{InvoiceId, Money, MovementId, SupplierId, VariantId};

/// What a movement does to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock enters the warehouse (purchase invoice line).
    Load,
    /// Stock leaves through a sale.
    Unload,
    /// Stock is thrown away (wilted, damaged).
    Destroy,
}

impl MovementKind {
    /// Whether this kind removes stock.
    #[must_use]
    pub const fn is_reduction(self) -> bool {
        matches!(self, Self::Unload | Self::Destroy)
    }

    /// Signed effect of `quantity` units of this kind on stock.
    #[must_use]
    pub const fn delta(self, quantity: u32) -> i64 {
        match self {
            Self::Load => quantity as i64,
            Self::Unload | Self::Destroy => -(quantity as i64),
        }
    }
}

impl FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "load" | "carico" => Ok(Self::Load),
            "unload" | "scarico" => Ok(Self::Unload),
            "destroy" | "distruzione" => Ok(Self::Destroy),
            _ => Err(format!("unknown movement kind: {s}")),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Unload => write!(f, "unload"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// A validated, immutable stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Unique id, assigned in increasing order.
    pub id: MovementId,
    /// Product variant affected.
    pub variant_id: VariantId,
    /// Load, unload or destroy.
    pub kind: MovementKind,
    /// Number of stems, always positive.
    pub quantity: u32,
    /// Acquisition cost per stem. Always present on loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Money>,
    /// Commercial packaging multiple at the time of the movement.
    pub package_size: u32,
    /// Invoice or document that generated the movement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_invoice_id: Option<InvoiceId>,
    /// Supplier, meaningful on loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<SupplierId>,
    /// Sale price set explicitly when the stock was loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Money>,
    /// When the movement happened; orders movements within a lot.
    pub occurred_at: NaiveDateTime,
    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Movement {
    /// Signed effect on stock.
    #[must_use]
    pub const fn delta(&self) -> i64 {
        self.kind.delta(self.quantity)
    }

    /// Ordering key within a lot: time first, id breaks ties.
    #[must_use]
    pub const fn sequence_key(&self) -> (NaiveDateTime, MovementId) {
        (self.occurred_at, self.id)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} x{} of {}",
            self.id, self.occurred_at, self.kind, self.quantity, self.variant_id
        )?;
        if let Some(cost) = self.unit_cost {
            write!(f, " @ {cost}")?;
        }
        if let Some(invoice) = &self.source_invoice_id {
            write!(f, " [{invoice}]")?;
        }
        Ok(())
    }
}

/// Reasons a draft movement is rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The variant id is empty.
    #[error("movement has no variant id")]
    MissingVariant,
    /// Quantity is zero or negative.
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),
    /// Quantity does not fit the stock counter.
    #[error("quantity {0} is too large")]
    QuantityOutOfRange(i64),
    /// Package size is zero or negative.
    #[error("package size must be positive, got {0}")]
    NonPositivePackageSize(i64),
    /// A load without acquisition cost.
    #[error("load movement requires a unit cost")]
    MissingUnitCost,
    /// Cost is negative or not representable.
    #[error("invalid unit cost {0}")]
    InvalidUnitCost(Decimal),
    /// Sale price is negative or not representable.
    #[error("invalid sale price {0}")]
    InvalidSalePrice(Decimal),
}

/// A movement as submitted by a caller, before validation.
///
/// Numeric fields are deliberately wide so that bad input can be reported
/// rather than failing to deserialize.
///
/// # Examples
///
/// ```
/// use floraledger_core::{MovementDraft, MovementId, MovementKind};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let movement = MovementDraft::load("rosa-rossa-60", 50, dec!(2.50), 10, at)
///     .with_invoice("FT-1")
///     .validate(MovementId(1))
///     .unwrap();
///
/// assert_eq!(movement.kind, MovementKind::Load);
/// assert_eq!(movement.unit_cost.unwrap().cents(), 250);
///
/// let bad = MovementDraft::unload("rosa-rossa-60", 0, 10, at).validate(MovementId(2));
/// assert!(bad.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    /// Product variant affected.
    pub variant_id: VariantId,
    /// Load, unload or destroy.
    pub kind: MovementKind,
    /// Number of stems.
    pub quantity: i64,
    /// Acquisition cost per stem.
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    /// Packaging multiple.
    pub package_size: i64,
    /// Generating invoice or document.
    #[serde(default)]
    pub source_invoice_id: Option<InvoiceId>,
    /// Supplier.
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    /// Explicit sale price.
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    /// When the movement happened.
    pub occurred_at: NaiveDateTime,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
}

impl MovementDraft {
    /// Create a draft of any kind.
    #[must_use]
    pub fn new(
        variant_id: impl Into<VariantId>,
        kind: MovementKind,
        quantity: i64,
        package_size: i64,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            kind,
            quantity,
            unit_cost: None,
            package_size,
            source_invoice_id: None,
            supplier_id: None,
            sale_price: None,
            occurred_at,
            note: None,
        }
    }

    /// Draft a load at the given unit cost.
    #[must_use]
    pub fn load(
        variant_id: impl Into<VariantId>,
        quantity: i64,
        unit_cost: Decimal,
        package_size: i64,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self::new(
            variant_id,
            MovementKind::Load,
            quantity,
            package_size,
            occurred_at,
        )
        .with_unit_cost(unit_cost)
    }

    /// Draft an unload (sale).
    #[must_use]
    pub fn unload(
        variant_id: impl Into<VariantId>,
        quantity: i64,
        package_size: i64,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self::new(
            variant_id,
            MovementKind::Unload,
            quantity,
            package_size,
            occurred_at,
        )
    }

    /// Draft a destruction.
    #[must_use]
    pub fn destroy(
        variant_id: impl Into<VariantId>,
        quantity: i64,
        package_size: i64,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self::new(
            variant_id,
            MovementKind::Destroy,
            quantity,
            package_size,
            occurred_at,
        )
    }

    /// Set the unit cost.
    #[must_use]
    pub const fn with_unit_cost(mut self, cost: Decimal) -> Self {
        self.unit_cost = Some(cost);
        self
    }

    /// Set the source invoice.
    #[must_use]
    pub fn with_invoice(mut self, invoice: impl Into<InvoiceId>) -> Self {
        self.source_invoice_id = Some(invoice.into());
        self
    }

    /// Set the supplier.
    #[must_use]
    pub fn with_supplier(mut self, supplier: impl Into<SupplierId>) -> Self {
        self.supplier_id = Some(supplier.into());
        self
    }

    /// Set an explicit sale price.
    #[must_use]
    pub const fn with_sale_price(mut self, price: Decimal) -> Self {
        self.sale_price = Some(price);
        self
    }

    /// Attach a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Check the draft and turn it into a movement with the given id.
    pub fn validate(self, id: MovementId) -> Result<Movement, ValidationError> {
        if self.variant_id.is_blank() {
            return Err(ValidationError::MissingVariant);
        }
        if self.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        let quantity = u32::try_from(self.quantity)
            .map_err(|_| ValidationError::QuantityOutOfRange(self.quantity))?;
        if self.package_size <= 0 {
            return Err(ValidationError::NonPositivePackageSize(self.package_size));
        }
        let package_size = u32::try_from(self.package_size)
            .map_err(|_| ValidationError::NonPositivePackageSize(self.package_size))?;

        let unit_cost = match self.unit_cost {
            Some(cost) => {
                Some(non_negative_money(cost).ok_or(ValidationError::InvalidUnitCost(cost))?)
            }
            None if self.kind == MovementKind::Load => {
                return Err(ValidationError::MissingUnitCost);
            }
            None => None,
        };
        let sale_price = match self.sale_price {
            Some(price) => {
                Some(non_negative_money(price).ok_or(ValidationError::InvalidSalePrice(price))?)
            }
            None => None,
        };

        Ok(Movement {
            id,
            variant_id: self.variant_id,
            kind: self.kind,
            quantity,
            unit_cost,
            package_size,
            source_invoice_id: self.source_invoice_id.filter(|i| !i.is_blank()),
            supplier_id: self.supplier_id.filter(|s| !s.is_blank()),
            sale_price,
            occurred_at: self.occurred_at,
            note: self.note,
        })
    }
}

fn non_negative_money(value: Decimal) -> Option<Money> {
    Money::from_decimal(value).filter(|m| !m.is_negative())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_kind_delta() {
        assert_eq!(MovementKind::Load.delta(5), 5);
        assert_eq!(MovementKind::Unload.delta(5), -5);
        assert_eq!(MovementKind::Destroy.delta(5), -5);
        assert!(MovementKind::Destroy.is_reduction());
        assert!(!MovementKind::Load.is_reduction());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("LOAD".parse::<MovementKind>(), Ok(MovementKind::Load));
        assert_eq!("scarico".parse::<MovementKind>(), Ok(MovementKind::Unload));
        assert_eq!("destroy".parse::<MovementKind>(), Ok(MovementKind::Destroy));
        assert!("sell".parse::<MovementKind>().is_err());
    }

    #[test]
    fn test_validate_load() {
        let movement = MovementDraft::load("tulipano", 50, dec!(2.50), 10, at(1))
            .with_invoice("FT-1")
            .with_supplier("olanda-srl")
            .validate(MovementId(1))
            .unwrap();
        assert_eq!(movement.quantity, 50);
        assert_eq!(movement.unit_cost, Some(Money::from_cents(250)));
        assert_eq!(movement.package_size, 10);
        assert_eq!(movement.delta(), 50);
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let err = MovementDraft::unload("tulipano", 0, 10, at(1))
            .validate(MovementId(1))
            .unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveQuantity(0));

        let err = MovementDraft::load("tulipano", -3, dec!(1), 10, at(1))
            .validate(MovementId(1))
            .unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveQuantity(-3));
    }

    #[test]
    fn test_validate_rejects_load_without_cost() {
        let err = MovementDraft::new("tulipano", MovementKind::Load, 5, 10, at(1))
            .validate(MovementId(1))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingUnitCost);
    }

    #[test]
    fn test_validate_unload_without_cost_is_fine() {
        let movement = MovementDraft::unload("tulipano", 5, 10, at(1))
            .validate(MovementId(3))
            .unwrap();
        assert!(movement.unit_cost.is_none());
        assert_eq!(movement.delta(), -5);
    }

    #[test]
    fn test_validate_rejects_bad_package_and_cost() {
        let err = MovementDraft::load("tulipano", 5, dec!(1), 0, at(1))
            .validate(MovementId(1))
            .unwrap_err();
        assert_eq!(err, ValidationError::NonPositivePackageSize(0));

        let err = MovementDraft::load("tulipano", 5, dec!(-1), 10, at(1))
            .validate(MovementId(1))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidUnitCost(dec!(-1)));

        let err = MovementDraft::load("", 5, dec!(1), 10, at(1))
            .validate(MovementId(1))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingVariant);
    }

    #[test]
    fn test_validate_drops_blank_invoice() {
        let movement = MovementDraft::unload("tulipano", 5, 10, at(1))
            .with_invoice(" ")
            .validate(MovementId(1))
            .unwrap();
        assert!(movement.source_invoice_id.is_none());
    }

    #[test]
    fn test_sequence_key_breaks_ties_by_id() {
        let a = MovementDraft::unload("t", 1, 1, at(1))
            .validate(MovementId(2))
            .unwrap();
        let b = MovementDraft::unload("t", 1, 1, at(1))
            .validate(MovementId(1))
            .unwrap();
        assert!(b.sequence_key() < a.sequence_key());
    }
}
