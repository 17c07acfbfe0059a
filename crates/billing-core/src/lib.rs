//! Shared types for the billing consolidator.
//!
//! Holds the data model, the error type, filename classification, currency
//! parsing, display formatting and the command-line settings used by every
//! other crate in the workspace.

pub mod classifier;
pub mod currency;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{BillingError, Result};
pub use models::InvoiceCategory;
