//! The persisted ledger document.

use floraledger_core::{Lot, LotId, Movement, MovementId, VariantId};
use floraledger_reconcile::LotIdSequence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the store persists, as one JSON object.
///
/// Top-level keys this crate does not know about are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Raw engine options, see [`crate::Options`].
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
    /// Id the next ingested movement gets.
    #[serde(default = "first_movement_id")]
    pub next_movement_id: u64,
    /// Id the next created lot gets.
    #[serde(default)]
    pub next_lot_id: LotIdSequence,
    /// Append-only movement log.
    #[serde(default)]
    pub movements: Vec<Movement>,
    /// Derived lot set, sorted by id.
    #[serde(default)]
    pub lots: Vec<Lot>,
    /// Keys written by other tools.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

const fn first_movement_id() -> u64 {
    1
}

impl Default for Document {
    fn default() -> Self {
        Self {
            options: BTreeMap::new(),
            next_movement_id: first_movement_id(),
            next_lot_id: LotIdSequence::default(),
            movements: Vec::new(),
            lots: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl Document {
    /// Parse a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serialize as pretty-printed JSON with a trailing newline.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Take the next movement id.
    ///
    /// Never returns an id already present in the log, even if the counter
    /// was edited by hand.
    pub fn allocate_movement_id(&mut self) -> MovementId {
        let past_log = self
            .movements
            .iter()
            .map(|m| m.id.0 + 1)
            .max()
            .unwrap_or(1);
        let id = self.next_movement_id.max(past_log).max(1);
        self.next_movement_id = id + 1;
        MovementId(id)
    }

    /// The lot id sequence, advanced past every lot present.
    #[must_use]
    pub fn lot_ids(&self) -> LotIdSequence {
        let mut ids = self.next_lot_id;
        ids.skip_past(&self.lots);
        ids
    }

    /// Look up a lot by id.
    #[must_use]
    pub fn lot(&self, id: LotId) -> Option<&Lot> {
        self.lots.iter().find(|l| l.id == id)
    }

    /// Look up a lot by id for modification.
    pub fn lot_mut(&mut self, id: LotId) -> Option<&mut Lot> {
        self.lots.iter_mut().find(|l| l.id == id)
    }

    /// Lots of one variant, or all of them.
    pub fn lots_of<'a>(&'a self, variant: Option<&'a VariantId>) -> impl Iterator<Item = &'a Lot> {
        self.lots
            .iter()
            .filter(move |l| variant.map_or(true, |v| l.variant_id() == v))
    }
}
