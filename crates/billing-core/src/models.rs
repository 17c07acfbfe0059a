use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BillingError;

// ── InvoiceCategory ───────────────────────────────────────────────────────────

/// Layout class of an invoice workbook, derived from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceCategory {
    /// Hospital invoices: one header row above the line items.
    Hospital,
    /// Professional invoices: header split over two rows, some cells merged.
    Professional,
}

impl InvoiceCategory {
    /// Display label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceCategory::Hospital => "Hospital",
            InvoiceCategory::Professional => "Professional",
        }
    }

    /// Lowercase token searched for in workbook filenames.
    pub fn filename_token(&self) -> &'static str {
        match self {
            InvoiceCategory::Hospital => "hospital",
            InvoiceCategory::Professional => "professional",
        }
    }
}

impl fmt::Display for InvoiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceCategory {
    type Err = BillingError;

    /// Case-insensitive parse of `"hospital"` or `"professional"`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "hospital" => Ok(InvoiceCategory::Hospital),
            "professional" => Ok(InvoiceCategory::Professional),
            other => Err(BillingError::Config(format!(
                "unknown invoice category: {other}"
            ))),
        }
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

/// The three parsed amounts of one invoice line, before provenance is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Amounts {
    pub charge_amount: Decimal,
    pub adjustment: Decimal,
    pub balance_due: Decimal,
}

impl Amounts {
    /// Field-wise absolute value.
    pub fn abs(&self) -> Self {
        Self {
            charge_amount: self.charge_amount.abs(),
            adjustment: self.adjustment.abs(),
            balance_due: self.balance_due.abs(),
        }
    }

    /// Field-wise sum, or `None` if any field overflows.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        Some(Self {
            charge_amount: self.charge_amount.checked_add(other.charge_amount)?,
            adjustment: self.adjustment.checked_add(other.adjustment)?,
            balance_due: self.balance_due.checked_add(other.balance_due)?,
        })
    }

    /// Field-wise sum clamped to the `Decimal` range.
    pub fn saturating_add(&self, other: &Self) -> Self {
        Self {
            charge_amount: self.charge_amount.saturating_add(other.charge_amount),
            adjustment: self.adjustment.saturating_add(other.adjustment),
            balance_due: self.balance_due.saturating_add(other.balance_due),
        }
    }
}

/// Where a row came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub source_workbook: String,
    pub source_sheet: String,
    pub invoice_category: InvoiceCategory,
}

impl Provenance {
    pub fn new(
        source_workbook: impl Into<String>,
        source_sheet: impl Into<String>,
        invoice_category: InvoiceCategory,
    ) -> Self {
        Self {
            source_workbook: source_workbook.into(),
            source_sheet: source_sheet.into(),
            invoice_category,
        }
    }
}

/// One normalized invoice line with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRow {
    pub charge_amount: Decimal,
    pub adjustment: Decimal,
    pub balance_due: Decimal,
    pub source_sheet: String,
    pub source_workbook: String,
    pub invoice_category: InvoiceCategory,
}

impl ExtractedRow {
    /// The row's amounts without provenance.
    pub fn amounts(&self) -> Amounts {
        Amounts {
            charge_amount: self.charge_amount,
            adjustment: self.adjustment,
            balance_due: self.balance_due,
        }
    }

    /// `true` when the row was tagged with exactly this workbook and sheet.
    pub fn is_from(&self, workbook: &str, sheet: &str) -> bool {
        self.source_workbook == workbook && self.source_sheet == sheet
    }
}

// ── Sheet-level records ───────────────────────────────────────────────────────

/// Label/value pairs found above a sheet's table. Missing fields are blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetMetadata {
    pub pi: String,
    pub study_name: String,
    pub study_code: String,
    pub irb_no: String,
    pub kfs_no: String,
}

/// Everything known about a processed sheet apart from its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSource {
    pub provenance: Provenance,
    /// First day of the invoice month parsed from the workbook filename.
    pub invoice_date: Option<NaiveDate>,
    pub metadata: SheetMetadata,
    /// Rows read between the header and the terminator, before normalization.
    pub scanned_rows: usize,
}

/// Rows extracted from one sheet together with their source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetBatch {
    pub source: SheetSource,
    pub rows: Vec<ExtractedRow>,
}

/// Per-sheet rollup recorded by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub source_sheet: String,
    pub source_workbook: String,
    pub invoice_category: InvoiceCategory,
    pub row_count: usize,
    pub charge_amount: Decimal,
    pub adjustment: Decimal,
    pub balance_due: Decimal,
    pub invoice_date: Option<NaiveDate>,
    pub metadata: SheetMetadata,
    pub scanned_rows: usize,
}

impl SheetSummary {
    /// The summed amounts of this sheet.
    pub fn amounts(&self) -> Amounts {
        Amounts {
            charge_amount: self.charge_amount,
            adjustment: self.adjustment,
            balance_due: self.balance_due,
        }
    }

    /// Rows that were read but dropped by the normalizer.
    pub fn dropped_rows(&self) -> usize {
        self.scanned_rows.saturating_sub(self.row_count)
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Grand totals across every summary of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetTotals {
    pub workbooks: usize,
    pub sheets: usize,
    pub rows: usize,
    pub charge_amount: Decimal,
    pub adjustment: Decimal,
    pub balance_due: Decimal,
}

/// All extracted rows and sheet summaries, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedDataset {
    pub rows: Vec<ExtractedRow>,
    pub summaries: Vec<SheetSummary>,
}

impl AggregatedDataset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.summaries.is_empty()
    }

    /// Distinct workbook names in first-seen order.
    pub fn source_workbooks(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for summary in &self.summaries {
            if !seen.contains(&summary.source_workbook.as_str()) {
                seen.push(&summary.source_workbook);
            }
        }
        seen
    }

    /// Sum of every summary.
    pub fn totals(&self) -> DatasetTotals {
        let mut totals = DatasetTotals {
            workbooks: self.source_workbooks().len(),
            sheets: self.summaries.len(),
            ..DatasetTotals::default()
        };
        let mut amounts = Amounts::default();
        for summary in &self.summaries {
            totals.rows += summary.row_count;
            amounts = amounts.saturating_add(&summary.amounts());
        }
        totals.charge_amount = amounts.charge_amount;
        totals.adjustment = amounts.adjustment;
        totals.balance_due = amounts.balance_due;
        totals
    }
}

// ── Outcome records ───────────────────────────────────────────────────────────

/// A sheet that was skipped without aborting its workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipWarning {
    pub workbook: String,
    pub sheet: String,
    pub reason: String,
}

/// A workbook that produced no rows because of a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookFailure {
    pub workbook: String,
    pub reason: String,
}

/// Totals for one group of sheet summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotals<K> {
    pub key: K,
    pub sheets: usize,
    pub rows: usize,
    pub charge_amount: Decimal,
    pub adjustment: Decimal,
    pub balance_due: Decimal,
}

impl<K> GroupTotals<K> {
    pub fn new(key: K) -> Self {
        Self {
            key,
            sheets: 0,
            rows: 0,
            charge_amount: Decimal::ZERO,
            adjustment: Decimal::ZERO,
            balance_due: Decimal::ZERO,
        }
    }

    /// Accumulate one sheet summary into this group.
    pub fn add_summary(&mut self, summary: &SheetSummary) {
        self.sheets += 1;
        self.rows += summary.row_count;
        let amounts = summary.amounts();
        self.charge_amount = self.charge_amount.saturating_add(amounts.charge_amount);
        self.adjustment = self.adjustment.saturating_add(amounts.adjustment);
        self.balance_due = self.balance_due.saturating_add(amounts.balance_due);
    }
}
