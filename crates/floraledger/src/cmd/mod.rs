//! Command implementations for CLI tools.
//!
//! Each module contains the full implementation for a command,
//! which can be invoked by thin wrapper binaries.

pub mod adjust;
pub mod common;
pub mod dedup;
pub mod ingest;
pub mod lots;
pub mod price;
pub mod recompute;
