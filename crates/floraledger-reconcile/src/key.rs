//! Lot key derivation.
//!
//! A load always names its lot completely. A reduction usually does not: a
//! sale knows the variant and maybe the invoice the stems came from, rarely
//! the cost. [`derive_key`] therefore yields a [`LotTarget`], which is an
//! exact key when the movement carries enough to build one and a selector
//! over candidate lots otherwise.

use floraledger_core::{InvoiceId, LotKey, Money, Movement, MovementKind, VariantId};
use std::fmt;
use std::str::FromStr;

/// The lot, or set of candidate lots, a movement affects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LotTarget {
    /// Exactly this lot.
    Exact(LotKey),
    /// Any lot of the variant bought under this invoice.
    Invoice {
        /// Variant reduced.
        variant_id: VariantId,
        /// Invoice the stems were bought under.
        invoice_id: InvoiceId,
    },
    /// Any lot of the variant.
    Variant {
        /// Variant reduced.
        variant_id: VariantId,
    },
}

impl LotTarget {
    /// The variant this target belongs to.
    #[must_use]
    pub const fn variant_id(&self) -> &VariantId {
        match self {
            Self::Exact(key) => &key.variant_id,
            Self::Invoice { variant_id, .. } | Self::Variant { variant_id } => variant_id,
        }
    }

    /// The exact key, if this target names one.
    #[must_use]
    pub const fn exact(&self) -> Option<&LotKey> {
        match self {
            Self::Exact(key) => Some(key),
            _ => None,
        }
    }

    /// Whether `key` is the named lot (for [`LotTarget::Exact`]) or one of
    /// the candidates.
    #[must_use]
    pub fn admits(&self, key: &LotKey, tolerance: Money) -> bool {
        match self {
            Self::Exact(target) => target.matches(key, tolerance),
            Self::Invoice {
                variant_id,
                invoice_id,
            } => {
                key.variant_id == *variant_id && key.source_invoice_id.as_ref() == Some(invoice_id)
            }
            Self::Variant { variant_id } => key.variant_id == *variant_id,
        }
    }

    /// The cohort an exact reduction falls back to when its lot is empty:
    /// the invoice when there is one, the whole variant otherwise.
    #[must_use]
    pub fn fallback(&self) -> Self {
        match self {
            Self::Exact(key) => match &key.source_invoice_id {
                Some(invoice_id) => Self::Invoice {
                    variant_id: key.variant_id.clone(),
                    invoice_id: invoice_id.clone(),
                },
                None => Self::Variant {
                    variant_id: key.variant_id.clone(),
                },
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for LotTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => write!(f, "lot {key}"),
            Self::Invoice {
                variant_id,
                invoice_id,
            } => write!(f, "{variant_id} lots of invoice {invoice_id}"),
            Self::Variant { variant_id } => write!(f, "{variant_id} lots"),
        }
    }
}

/// Map a movement to the lot it affects.
///
/// Pure and deterministic. Loads yield their own key. Reductions yield an
/// exact key when they carry a unit cost, an invoice selector when they only
/// carry an invoice, and a variant selector otherwise.
///
/// A load always has a cost once validated; for an unvalidated load the key
/// uses a zero cost rather than failing, and the fold rejects such a movement
/// before ever deriving its key.
///
/// # Examples
///
/// ```
/// use floraledger_core::{MovementDraft, MovementId};
/// use floraledger_reconcile::{derive_key, LotTarget};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let sale = MovementDraft::unload("rosa", 5, 10, at).validate(MovementId(9)).unwrap();
///
/// assert!(matches!(derive_key(&sale), LotTarget::Variant { .. }));
/// ```
#[must_use]
pub fn derive_key(movement: &Movement) -> LotTarget {
    let exact = |cost: Money| {
        LotTarget::Exact(LotKey::new(
            movement.variant_id.clone(),
            movement.source_invoice_id.clone(),
            cost,
            movement.package_size,
        ))
    };

    match (movement.kind, movement.unit_cost, &movement.source_invoice_id) {
        (MovementKind::Load, cost, _) => exact(cost.unwrap_or_default()),
        (_, Some(cost), _) => exact(cost),
        (_, None, Some(invoice_id)) => LotTarget::Invoice {
            variant_id: movement.variant_id.clone(),
            invoice_id: invoice_id.clone(),
        },
        (_, None, None) => LotTarget::Variant {
            variant_id: movement.variant_id.clone(),
        },
    }
}

/// How reductions that do not name an exact lot are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReductionPolicy {
    /// Consume the oldest candidate lot with stock first, spilling into the
    /// next candidate when one lot is not enough.
    #[default]
    Fifo,
    /// Require exactly one candidate lot with stock. Anything else is
    /// skipped with a diagnostic.
    Strict,
}

impl FromStr for ReductionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FIFO" => Ok(Self::Fifo),
            "STRICT" => Ok(Self::Strict),
            _ => Err(format!("unknown reduction policy: {s}")),
        }
    }
}

impl fmt::Display for ReductionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => write!(f, "FIFO"),
            Self::Strict => write!(f, "STRICT"),
        }
    }
}
