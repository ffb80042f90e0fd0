//! Non-fatal findings reported by reconciliation and dedup.
//!
//! | Code  | Description |
//! |-------|-------------|
//! | R1001 | Reduction matched no lot |
//! | R1002 | Reduction exceeded stock, clamped at zero |
//! | R1003 | Reduction ambiguous under strict matching |
//! | R2001 | Duplicate lot discarded |
//! | R2002 | Duplicate lot summed into canonical lot |

use floraledger_core::{LotId, MovementId, VariantId};
use std::fmt;

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// R1001: an unload or destroy found no lot to reduce.
    UnmatchedReduction,
    /// R1002: a reduction asked for more than the lot held.
    NegativeStockClamped,
    /// R1003: strict matching found several lots for a reduction.
    AmbiguousReduction,
    /// R2001: a duplicate lot record was dropped.
    DuplicateLotDiscarded,
    /// R2002: a duplicate lot record was folded into its canonical lot.
    DuplicateLotSummed,
}

impl DiagnosticCode {
    /// Get the code string (e.g., "R1001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnmatchedReduction => "R1001",
            Self::NegativeStockClamped => "R1002",
            Self::AmbiguousReduction => "R1003",
            Self::DuplicateLotDiscarded => "R2001",
            Self::DuplicateLotSummed => "R2002",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A finding that does not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What happened.
    pub code: DiagnosticCode,
    /// Human-readable detail.
    pub message: String,
    /// Variant concerned.
    pub variant_id: Option<VariantId>,
    /// Movement that triggered it.
    pub movement: Option<MovementId>,
    /// Lot concerned.
    pub lot: Option<LotId>,
}

impl Diagnostic {
    /// Create a diagnostic.
    #[must_use]
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            variant_id: None,
            movement: None,
            lot: None,
        }
    }

    /// Attach the variant.
    #[must_use]
    pub fn with_variant(mut self, variant_id: &VariantId) -> Self {
        self.variant_id = Some(variant_id.clone());
        self
    }

    /// Attach the movement.
    #[must_use]
    pub const fn with_movement(mut self, movement: MovementId) -> Self {
        self.movement = Some(movement);
        self
    }

    /// Attach the lot.
    #[must_use]
    pub const fn with_lot(mut self, lot: LotId) -> Self {
        self.lot = Some(lot);
        self
    }

    /// Emit this diagnostic as a tracing event.
    pub(crate) fn trace(&self) {
        tracing::warn!(
            code = self.code.code(),
            variant = self.variant_id.as_ref().map(VariantId::as_str),
            movement = self.movement.map(|m| m.0),
            lot = self.lot.map(|l| l.0),
            "{}",
            self.message
        );
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
