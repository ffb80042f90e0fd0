//! Flower stock ledger CLI tools.
//!
//! This crate provides command-line tools over a floraledger store file:
//!
//! - `fl-ingest`: Post load, unload and destroy movements
//! - `fl-lots`: List lots in stock
//! - `fl-recompute`: Rebuild all lots from the movement log
//! - `fl-dedup`: Collapse duplicate lot records
//! - `fl-adjust`: Correct the quantity of a lot
//! - `fl-price`: Set an explicit sale price
//!
//! # Example Usage
//!
//! ```bash
//! fl-ingest -s stock.json --kind load --variant rosa-rossa --quantity 50 \
//!     --cost 2.50 --package 10 --invoice FT-1
//! fl-lots -s stock.json rosa-rossa
//! fl-recompute -s stock.json -o reduction_policy=STRICT
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod report;
