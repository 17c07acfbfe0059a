//! Data layer for the billing consolidator.
//!
//! Opens invoice workbooks, locates and extracts each sheet's table,
//! normalizes and tags its rows, and accumulates them into a dataset with
//! per-sheet summaries and rollups.

pub mod aggregator;
pub mod extractor;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod reader;
pub mod sheet;

pub use billing_core as core;
pub use pipeline::{consolidate, process_workbook, ConsolidationOutcome, OutcomeBuilder};
pub use reader::WorkbookInput;
