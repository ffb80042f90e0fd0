//! Core types for floraledger
//!
//! This crate provides the plain records shared by the reconciliation engine
//! and the store:
//!
//! - [`Money`] - A currency amount held as integer cents
//! - [`Movement`] - One entry of the append-only stock log
//! - [`MovementDraft`] - An unvalidated movement as submitted by a caller
//! - [`LotKey`] - The identity of a stock lot
//! - [`Lot`] - A persisted lot record derived from movements
//!
//! # Example
//!
//! ```
//! use floraledger_core::{MovementDraft, MovementId, LotKey, Money};
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
//!
//! // Post an invoice line
//! let load = MovementDraft::load("rosa-rossa-60", 50, dec!(2.50), 10, at)
//!     .with_invoice("FT-1")
//!     .validate(MovementId(1))
//!     .unwrap();
//!
//! // The lot it opens
//! let key = LotKey::new("rosa-rossa-60", Some("FT-1".into()), Money::from_cents(250), 10);
//! assert_eq!(load.unit_cost, Some(key.unit_cost));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ids;
pub mod lot;
pub mod money;
pub mod movement;

pub use ids::{InvoiceId, LotId, MovementId, SupplierId, VariantId};
pub use lot::{Lot, LotKey, SalePrice};
pub use money::{Money, ParseMoneyError};
pub use movement::{Movement, MovementDraft, MovementKind, ValidationError};

// Re-export commonly used external types
pub use chrono::{NaiveDate, NaiveDateTime};
pub use rust_decimal::Decimal;
