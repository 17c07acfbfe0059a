//! Runtime orchestration layer for the billing consolidator.
//!
//! Runs workbook processing on a bounded pool of blocking workers and merges
//! the results in upload order.

pub mod orchestrator;

pub use billing_core as core;
pub use billing_data as data;
pub use orchestrator::{ConsolidationOrchestrator, ProgressEvent};
