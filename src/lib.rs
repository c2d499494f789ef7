//! # Reconciliation Core
//!
//! Matches an internal ledger export against a payment provider statement
//! by transaction reference and classifies every reference.
//!
//! ## Features
//!
//! - **Reference matching**: trimmed-key matching with last-record-wins de-duplication
//! - **Discrepancy detection**: amount mismatches beyond a tolerance, case-insensitive status comparison
//! - **Diagnostics**: counts of dropped, overwritten and coerced records
//! - **Record sources**: CSV files or in-memory records behind an async trait
//! - **Sessions**: caller-owned state holding both inputs and the latest run
//! - **Export**: one CSV per result category
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{reconcile, Issue, TransactionRecord};
//!
//! let internal = vec![TransactionRecord::new()
//!     .with("transaction_reference", "A1")
//!     .with("amount", "100.00")
//!     .with("status", "Paid")];
//! let provider = vec![TransactionRecord::new()
//!     .with("transaction_reference", "A1")
//!     .with("amount", "100.02")
//!     .with("status", "paid")];
//!
//! let result = reconcile(&internal, &provider);
//! assert_eq!(result.matched[0].issues, vec![Issue::AmountMismatch]);
//! ```

pub mod config;
pub mod reconciliation;
pub mod session;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use reconciliation::{reconcile, ReconciliationEngine};
pub use session::*;
pub use traits::*;
pub use types::*;
