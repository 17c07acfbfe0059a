//! Accumulation of tagged rows into a dataset, plus study and account
//! rollups over the per-sheet summaries.

use std::collections::BTreeMap;

use billing_core::error::{BillingError, Result};
use billing_core::models::{
    AggregatedDataset, Amounts, ExtractedRow, GroupTotals, SheetBatch, SheetSource, SheetSummary,
};
use billing_core::InvoiceCategory;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Owned accumulator of extracted rows and sheet summaries.
///
/// Rows and summaries keep the order in which sheets were added. The
/// aggregator tracks the sum of absolute amounts it has accepted and rejects
/// any sheet that would push it past what `Decimal` can hold, so every sum
/// over a subset of its rows (sheet, group or grand total) is exact.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    rows: Vec<ExtractedRow>,
    summaries: Vec<SheetSummary>,
    magnitude: Amounts,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sheet's rows and record its summary.
    ///
    /// A sheet that yielded no rows still gets a summary with zero totals.
    /// A sheet whose amounts would overflow the running totals is rejected
    /// with [`BillingError::AmountOverflow`] and leaves the aggregator
    /// unchanged.
    pub fn add_sheet(&mut self, rows: Vec<ExtractedRow>, source: SheetSource) -> Result<()> {
        let overflow = || BillingError::AmountOverflow {
            workbook: source.provenance.source_workbook.clone(),
            sheet: source.provenance.source_sheet.clone(),
        };

        let mut magnitude = self.magnitude;
        for row in &rows {
            magnitude = magnitude
                .checked_add(&row.amounts().abs())
                .ok_or_else(overflow)?;
        }

        // Bounded by `magnitude`, so these sums cannot overflow.
        let totals = rows
            .iter()
            .fold(Amounts::default(), |acc, row| acc.saturating_add(&row.amounts()));

        let SheetSource {
            provenance,
            invoice_date,
            metadata,
            scanned_rows,
        } = source;

        debug!(
            workbook = %provenance.source_workbook,
            sheet = %provenance.source_sheet,
            rows = rows.len(),
            "sheet aggregated"
        );

        self.magnitude = magnitude;
        self.summaries.push(SheetSummary {
            source_sheet: provenance.source_sheet,
            source_workbook: provenance.source_workbook,
            invoice_category: provenance.invoice_category,
            row_count: rows.len(),
            charge_amount: totals.charge_amount,
            adjustment: totals.adjustment,
            balance_due: totals.balance_due,
            invoice_date,
            metadata,
            scanned_rows,
        });
        self.rows.extend(rows);
        Ok(())
    }

    pub fn add_batch(&mut self, batch: SheetBatch) -> Result<()> {
        self.add_sheet(batch.rows, batch.source)
    }

    /// Number of summaries recorded so far.
    pub fn sheet_count(&self) -> usize {
        self.summaries.len()
    }

    /// Snapshot of everything added so far. Calling it again returns an
    /// equal dataset.
    pub fn finalize(&self) -> AggregatedDataset {
        AggregatedDataset {
            rows: self.rows.clone(),
            summaries: self.summaries.clone(),
        }
    }

    /// Consume the aggregator without copying.
    pub fn into_dataset(self) -> AggregatedDataset {
        AggregatedDataset {
            rows: self.rows,
            summaries: self.summaries,
        }
    }
}

// ── Rollups ───────────────────────────────────────────────────────────────────

/// Grouping key of the study-level rollup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudyKey {
    pub study_name: String,
    pub study_code: String,
    pub kfs_no: String,
    pub irb_no: String,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_category: InvoiceCategory,
}

/// Grouping key of the account-level rollup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountKey {
    pub kfs_no: String,
    pub invoice_category: InvoiceCategory,
    pub invoice_date: Option<NaiveDate>,
}

impl From<&SheetSummary> for StudyKey {
    fn from(summary: &SheetSummary) -> Self {
        Self {
            study_name: summary.metadata.study_name.clone(),
            study_code: summary.metadata.study_code.clone(),
            kfs_no: summary.metadata.kfs_no.clone(),
            irb_no: summary.metadata.irb_no.clone(),
            invoice_date: summary.invoice_date,
            invoice_category: summary.invoice_category,
        }
    }
}

impl From<&SheetSummary> for AccountKey {
    fn from(summary: &SheetSummary) -> Self {
        Self {
            kfs_no: summary.metadata.kfs_no.clone(),
            invoice_category: summary.invoice_category,
            invoice_date: summary.invoice_date,
        }
    }
}

/// Totals per study, sorted by key.
pub fn study_rollup(dataset: &AggregatedDataset) -> Vec<GroupTotals<StudyKey>> {
    rollup_by(&dataset.summaries, |s| StudyKey::from(s))
}

/// Totals per account, sorted by key.
pub fn account_rollup(dataset: &AggregatedDataset) -> Vec<GroupTotals<AccountKey>> {
    rollup_by(&dataset.summaries, |s| AccountKey::from(s))
}

fn rollup_by<K, F>(summaries: &[SheetSummary], key_fn: F) -> Vec<GroupTotals<K>>
where
    K: Ord + Clone,
    F: Fn(&SheetSummary) -> K,
{
    let mut groups: BTreeMap<K, GroupTotals<K>> = BTreeMap::new();
    for summary in summaries {
        let key = key_fn(summary);
        groups
            .entry(key.clone())
            .or_insert_with(|| GroupTotals::new(key))
            .add_summary(summary);
    }
    groups.into_values().collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
