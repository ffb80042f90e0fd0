//! Persistence and the ledger facade for floraledger.
//!
//! The store keeps the whole ledger in one JSON document: the movement log,
//! the derived lot set, the id counters and the engine options. Every
//! operation is a single read-modify-write of that document:
//!
//! 1. [`Storage::load`] returns the document and its [`Revision`].
//! 2. The operation runs against the in-memory document.
//! 3. [`Storage::save`] writes it back, failing with
//!    [`StoreError::ConcurrentWriteConflict`] if the file changed since step 1.
//!    [`JsonStore`] holds a `<store>.lock` file from that check until the new
//!    file is in place, so writers in other processes cannot slip between.
//!
//! A failed operation never writes.
//!
//! # Example
//!
//! ```no_run
//! use floraledger_core::MovementDraft;
//! use floraledger_store::{JsonStore, Ledger};
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new(JsonStore::new("stock.json"));
//! let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
//!
//! ledger.ingest(MovementDraft::load("rosa", 50, dec!(2.50), 10, at).with_invoice("FT-1"))?;
//! for lot in ledger.list_lots(None)? {
//!     println!("{} {} x{}", lot.id, lot.key, lot.quantity);
//! }
//! # Ok::<(), floraledger_store::StoreError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod ledger;
pub mod options;
mod store;

pub use document::Document;
pub use ledger::{DedupReport, Ledger, LotsChanged, Posting, RecomputeReport};
pub use options::{OptionWarning, Options};
pub use store::{JsonStore, MemoryStore, Revision, Snapshot, Storage, DEFAULT_LOCK_TIMEOUT};

use floraledger_core::{LotId, ValidationError};
use floraledger_reconcile::ReconcileError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while operating on the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error reading or writing the store file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The store file is not a valid document.
    #[error("malformed store document {path}: {source}")]
    Json {
        /// The store file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Another writer saved the store between our load and our save.
    #[error("{path} was modified concurrently (expected revision {expected}, found {found})")]
    ConcurrentWriteConflict {
        /// The store file.
        path: PathBuf,
        /// Revision the operation started from.
        expected: Revision,
        /// Revision found on disk at save time.
        found: Revision,
    },

    /// Another writer held the store's lock file for longer than we waited.
    ///
    /// A lock file left behind by a crashed writer must be removed by hand.
    #[error("{path} is locked by another writer")]
    Locked {
        /// The lock file.
        path: PathBuf,
    },

    /// A submitted movement was rejected.
    #[error("movement rejected: {0}")]
    Validation(#[from] ValidationError),

    /// The movement log could not be reconciled.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// No lot with the given id exists.
    #[error("unknown lot {0}")]
    UnknownLot(LotId),

    /// An option override could not be applied.
    #[error("invalid option \"{key}\": {message}")]
    InvalidOption {
        /// Option name.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

impl StoreError {
    /// Whether retrying the operation from a fresh load may succeed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentWriteConflict { .. } | Self::Locked { .. }
        )
    }
}
