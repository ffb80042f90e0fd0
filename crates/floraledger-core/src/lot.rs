//! Lot identity and persisted lot records.
//!
//! A [`LotKey`] names one distinguishable stock pool: a variant bought under
//! one invoice at one cost in one packaging. A [`Lot`] is the derived record
//! persisted for a key while it still holds stock.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{InvoiceId, LotId, Money, SupplierId, VariantId};

/// Grouping identity of a lot.
///
/// Keys order by variant first, so a sorted collection of keys keeps the
/// lots of one variant together.
///
/// # Examples
///
/// ```
/// use floraledger_core::{LotKey, Money};
///
/// let a = LotKey::new("rosa", Some("FT-1".into()), Money::from_cents(250), 10);
/// let b = LotKey::new("rosa", Some("FT-1".into()), Money::from_cents(251), 10);
///
/// assert!(!a.matches(&b, Money::CENT));
/// assert!(a.matches(&b, Money::from_cents(2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LotKey {
    /// Product variant.
    pub variant_id: VariantId,
    /// Invoice the stock was bought under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_invoice_id: Option<InvoiceId>,
    /// Acquisition cost per stem.
    pub unit_cost: Money,
    /// Packaging multiple.
    pub package_size: u32,
}

impl LotKey {
    /// Create a key.
    #[must_use]
    pub fn new(
        variant_id: impl Into<VariantId>,
        source_invoice_id: Option<InvoiceId>,
        unit_cost: Money,
        package_size: u32,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            source_invoice_id,
            unit_cost,
            package_size,
        }
    }

    /// Check whether two keys name the same lot, comparing cost within
    /// `tolerance` and every other field exactly.
    #[must_use]
    pub fn matches(&self, other: &Self, tolerance: Money) -> bool {
        self.variant_id == other.variant_id
            && self.source_invoice_id == other.source_invoice_id
            && self.package_size == other.package_size
            && self.unit_cost.is_near(other.unit_cost, tolerance)
    }
}

impl fmt::Display for LotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variant_id)?;
        if let Some(invoice) = &self.source_invoice_id {
            write!(f, " [{invoice}]")?;
        }
        write!(f, " @ {} x{}", self.unit_cost, self.package_size)
    }
}

/// Sale price of a lot and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "amount", rename_all = "lowercase")]
pub enum SalePrice {
    /// Set by an operator or supplied with the load; never recomputed.
    Explicit(Money),
    /// Computed from the acquisition cost when the lot was created.
    Derived(Money),
}

impl SalePrice {
    /// The price amount.
    #[must_use]
    pub const fn amount(self) -> Money {
        match self {
            Self::Explicit(m) | Self::Derived(m) => m,
        }
    }

    /// Whether the price was set explicitly.
    #[must_use]
    pub const fn is_explicit(self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

impl fmt::Display for SalePrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(m) => write!(f, "{m}"),
            Self::Derived(m) => write!(f, "{m}*"),
        }
    }
}

/// A persisted stock lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Stable id; lower ids are older records.
    pub id: LotId,
    /// Grouping identity.
    #[serde(flatten)]
    pub key: LotKey,
    /// Stems currently in stock.
    pub quantity: u64,
    /// Time of the most recent load into this lot.
    pub acquisition_date: NaiveDateTime,
    /// Supplier of the most recent load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<SupplierId>,
    /// Sale price.
    pub sale_price: SalePrice,
}

impl Lot {
    /// The lot's variant.
    #[must_use]
    pub const fn variant_id(&self) -> &VariantId {
        &self.key.variant_id
    }

    /// Check if the lot holds no stock.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Stock value at acquisition cost.
    #[must_use]
    pub fn book_value(&self) -> Money {
        let cents = i128::from(self.key.unit_cost.cents()) * i128::from(self.quantity);
        Money::from_cents(i64::try_from(cents).unwrap_or(i64::MAX))
    }

    /// Number of whole packages in stock.
    #[must_use]
    pub fn packages(&self) -> u64 {
        self.quantity
            .checked_div(u64::from(self.key.package_size))
            .unwrap_or(0)
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} qty {} sale {}",
            self.id, self.key, self.quantity, self.sale_price
        )
    }
}
