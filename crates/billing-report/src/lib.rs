//! Report rendering for the billing consolidator.
//!
//! Turns an [`AggregatedDataset`](billing_core::models::AggregatedDataset)
//! into an xlsx workbook with a per-sheet summary and the combined rows.

pub mod report;

pub use report::{build_report, report_filename};
