//! Per-workbook processing and the sequential consolidation driver.
//!
//! [`process_workbook`] runs classify → open → (detect → extract → normalize
//! → tag) per sheet. [`OutcomeBuilder`] is the single merge step that folds
//! workbook results into an [`Aggregator`] in submission order; both the
//! sequential [`consolidate`] and the concurrent runtime go through it.

use billing_core::classifier::{classify, invoice_date_from_filename};
use billing_core::error::Result;
use billing_core::models::{
    AggregatedDataset, Provenance, SheetBatch, SheetSource, SkipWarning, WorkbookFailure,
};
use billing_core::InvoiceCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::extractor::{extract_rows, normalize, tag};
use crate::layout::detect_header;
use crate::metadata::extract_metadata;
use crate::reader::{open_workbook, WorkbookInput};
use crate::sheet::Sheet;

/// Skip reason for a sheet without any content.
pub const EMPTY_SHEET_REASON: &str = "sheet is empty";

// ── Workbook processing ───────────────────────────────────────────────────────

/// Everything one workbook produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookExtraction {
    pub workbook: String,
    pub category: InvoiceCategory,
    /// One batch per processed sheet, in tab order.
    pub sheets: Vec<SheetBatch>,
    pub warnings: Vec<SkipWarning>,
}

impl WorkbookExtraction {
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|b| b.rows.len()).sum()
    }
}

/// Process one workbook.
///
/// Classification runs before the bytes are touched. Sheets without a
/// header are skipped with a warning; classification and read failures are
/// returned as errors.
pub fn process_workbook(filename: &str, bytes: &[u8]) -> Result<WorkbookExtraction> {
    let category = classify(filename)?;
    let invoice_date = invoice_date_from_filename(filename);
    debug!(
        workbook = filename,
        category = %category,
        "invoice date: {:?}",
        invoice_date
    );

    let sheets = open_workbook(filename, bytes)?;

    let mut extraction = WorkbookExtraction {
        workbook: filename.to_string(),
        category,
        sheets: Vec::with_capacity(sheets.len()),
        warnings: Vec::new(),
    };

    for sheet in &sheets {
        if sheet.is_blank() {
            debug!(workbook = filename, sheet = sheet.name(), "skipping empty sheet");
            extraction.warnings.push(SkipWarning {
                workbook: filename.to_string(),
                sheet: sheet.name().to_string(),
                reason: EMPTY_SHEET_REASON.to_string(),
            });
            continue;
        }

        match process_sheet(sheet, filename, category, invoice_date) {
            Ok(batch) => extraction.sheets.push(batch),
            Err(e) if !e.is_workbook_fatal() => {
                warn!("{}", e);
                extraction.warnings.push(SkipWarning {
                    workbook: filename.to_string(),
                    sheet: sheet.name().to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(extraction)
}

/// Process one sheet of an already-classified workbook.
pub fn process_sheet(
    sheet: &Sheet,
    workbook: &str,
    category: InvoiceCategory,
    invoice_date: Option<NaiveDate>,
) -> Result<SheetBatch> {
    let layout = detect_header(sheet, category, workbook)?;
    let provenance = Provenance::new(workbook, sheet.name(), category);

    let mut scanned_rows = 0;
    let rows: Vec<_> = extract_rows(sheet, &layout)
        .inspect(|_| scanned_rows += 1)
        .filter_map(|raw| normalize(&raw))
        .map(|amounts| tag(amounts, &provenance))
        .collect();

    debug!(
        workbook,
        sheet = sheet.name(),
        scanned = scanned_rows,
        kept = rows.len(),
        "sheet extracted"
    );

    let metadata = extract_metadata(sheet, category, layout.header_row());
    Ok(SheetBatch {
        source: SheetSource {
            provenance,
            invoice_date,
            metadata,
            scanned_rows,
        },
        rows,
    })
}

// ── Merge ─────────────────────────────────────────────────────────────────────

/// Result of consolidating a set of workbooks. Partial success is normal:
/// failed workbooks are listed next to the dataset built from the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationOutcome {
    pub dataset: AggregatedDataset,
    pub warnings: Vec<SkipWarning>,
    pub failures: Vec<WorkbookFailure>,
}

impl ConsolidationOutcome {
    /// Number of workbooks that were processed without a fatal error.
    pub fn succeeded(&self) -> usize {
        self.dataset.source_workbooks().len()
    }
}

/// Single-writer merge step: folds per-workbook results into an owned
/// aggregator in the order they are recorded.
#[derive(Debug, Default)]
pub struct OutcomeBuilder {
    aggregator: Aggregator,
    warnings: Vec<SkipWarning>,
    failures: Vec<WorkbookFailure>,
}

impl OutcomeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one workbook's result. A sheet whose amounts would overflow the
    /// running totals is skipped with a warning; the rest of the workbook is
    /// kept.
    pub fn record(&mut self, workbook: &str, result: Result<WorkbookExtraction>) {
        match result {
            Ok(extraction) => {
                info!(
                    workbook,
                    sheets = extraction.sheets.len(),
                    rows = extraction.row_count(),
                    skipped = extraction.warnings.len(),
                    "workbook processed"
                );
                for batch in extraction.sheets {
                    let sheet = batch.source.provenance.source_sheet.clone();
                    if let Err(e) = self.aggregator.add_batch(batch) {
                        warn!("{}", e);
                        self.warnings.push(SkipWarning {
                            workbook: workbook.to_string(),
                            sheet,
                            reason: e.to_string(),
                        });
                    }
                }
                self.warnings.extend(extraction.warnings);
            }
            Err(e) => self.record_failure(workbook, e.to_string()),
        }
    }

    /// Record a workbook that failed outside of [`process_workbook`].
    pub fn record_failure(&mut self, workbook: &str, reason: String) {
        warn!(workbook, "workbook failed: {}", reason);
        self.failures.push(WorkbookFailure {
            workbook: workbook.to_string(),
            reason,
        });
    }

    pub fn finish(self) -> ConsolidationOutcome {
        ConsolidationOutcome {
            dataset: self.aggregator.into_dataset(),
            warnings: self.warnings,
            failures: self.failures,
        }
    }
}

/// Process `inputs` one after another on the calling thread.
pub fn consolidate(inputs: &[WorkbookInput]) -> ConsolidationOutcome {
    let mut builder = OutcomeBuilder::new();
    for input in inputs {
        builder.record(&input.filename, process_workbook(&input.filename, &input.bytes));
    }
    builder.finish()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
