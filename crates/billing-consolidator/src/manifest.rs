//! JSON run manifest written next to the report with `--manifest`.

use std::path::{Path, PathBuf};

use billing_core::error::{BillingError, Result};
use billing_core::models::{
    DatasetTotals, GroupTotals, SheetSummary, SkipWarning, WorkbookFailure,
};
use billing_data::aggregator::{account_rollup, study_rollup, AccountKey, StudyKey};
use billing_data::ConsolidationOutcome;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub version: &'static str,
    pub generated_at: NaiveDateTime,
    pub report: PathBuf,
    pub totals: DatasetTotals,
    pub summaries: &'a [SheetSummary],
    pub study_rollup: Vec<GroupTotals<StudyKey>>,
    pub account_rollup: Vec<GroupTotals<AccountKey>>,
    pub warnings: &'a [SkipWarning],
    pub failures: &'a [WorkbookFailure],
}

impl<'a> RunManifest<'a> {
    pub fn new(outcome: &'a ConsolidationOutcome, report: &Path, generated_at: NaiveDateTime) -> Self {
        let dataset = &outcome.dataset;
        Self {
            version: env!("CARGO_PKG_VERSION"),
            generated_at,
            report: report.to_path_buf(),
            totals: dataset.totals(),
            summaries: &dataset.summaries,
            study_rollup: study_rollup(dataset),
            account_rollup: account_rollup(dataset),
            warnings: &outcome.warnings,
            failures: &outcome.failures,
        }
    }

    /// Path of the manifest belonging to `report`.
    pub fn path_for(report: &Path) -> PathBuf {
        report.with_extension("json")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| BillingError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
