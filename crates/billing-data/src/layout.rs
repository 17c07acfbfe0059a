//! Header detection.
//!
//! Locates the row (Hospital) or row pair (Professional) carrying the three
//! target labels and records the column of each. All layout-specific
//! knowledge lives here; the extractor only consumes [`HeaderLayout`].

use billing_core::error::{BillingError, Result};
use billing_core::InvoiceCategory;
use tracing::debug;

use crate::sheet::{normalize_label, Sheet};

/// Column label of the charge amount field.
pub const CHARGE_AMOUNT_LABEL: &str = "Charge Amount";
/// Column label of the adjustment field.
pub const ADJUSTMENT_LABEL: &str = "Adjustment";
/// Column label of the balance due field.
pub const BALANCE_DUE_LABEL: &str = "Balance Due";

/// The target labels in output order.
pub const TARGET_LABELS: [&str; 3] = [CHARGE_AMOUNT_LABEL, ADJUSTMENT_LABEL, BALANCE_DUE_LABEL];

// ── TargetColumns ─────────────────────────────────────────────────────────────

/// Column index of each target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetColumns {
    pub charge_amount: usize,
    pub adjustment: usize,
    pub balance_due: usize,
}

impl TargetColumns {
    /// Leftmost target column.
    pub fn first(&self) -> usize {
        self.charge_amount.min(self.adjustment).min(self.balance_due)
    }

    /// Rightmost target column.
    pub fn last(&self) -> usize {
        self.charge_amount.max(self.adjustment).max(self.balance_due)
    }

    /// Columns spanned by the table.
    pub fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.first()..=self.last()
    }
}

/// Partially filled column map used while scanning.
#[derive(Debug, Default)]
struct ColumnMatches([Option<usize>; 3]);

impl ColumnMatches {
    /// Record `col` for every still-unmatched label that `matches` accepts.
    fn offer(&mut self, col: usize, matches: impl Fn(&str) -> bool) {
        for (slot, label) in self.0.iter_mut().zip(normalized_targets()) {
            if slot.is_none() && matches(label.as_str()) {
                *slot = Some(col);
            }
        }
    }

    fn complete(&self) -> Option<TargetColumns> {
        match self.0 {
            [Some(charge_amount), Some(adjustment), Some(balance_due)] => Some(TargetColumns {
                charge_amount,
                adjustment,
                balance_due,
            }),
            _ => None,
        }
    }
}

fn normalized_targets() -> [String; 3] {
    TARGET_LABELS.map(normalize_label)
}

// ── HeaderLayout ──────────────────────────────────────────────────────────────

/// Where the header sits and how tall it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// All three labels on one row.
    SingleRow { row: usize, columns: TargetColumns },
    /// Labels spread over `top` and `top + 1`.
    SplitRow { top: usize, columns: TargetColumns },
}

impl HeaderLayout {
    pub fn columns(&self) -> &TargetColumns {
        match self {
            HeaderLayout::SingleRow { columns, .. } | HeaderLayout::SplitRow { columns, .. } => {
                columns
            }
        }
    }

    /// First row of the header.
    pub fn header_row(&self) -> usize {
        match self {
            HeaderLayout::SingleRow { row, .. } => *row,
            HeaderLayout::SplitRow { top, .. } => *top,
        }
    }

    /// First row below the header.
    pub fn data_start(&self) -> usize {
        match self {
            HeaderLayout::SingleRow { row, .. } => row + 1,
            HeaderLayout::SplitRow { top, .. } => top + 2,
        }
    }
}

// ── Detection ─────────────────────────────────────────────────────────────────

/// Locate the header of `sheet` for the given invoice category.
///
/// `workbook` is only used to label the error.
pub fn detect_header(
    sheet: &Sheet,
    category: InvoiceCategory,
    workbook: &str,
) -> Result<HeaderLayout> {
    let found = match category {
        InvoiceCategory::Hospital => find_single_row(sheet),
        InvoiceCategory::Professional => find_split_rows(sheet),
    };

    match found {
        Some(layout) => {
            debug!(
                sheet = sheet.name(),
                header_row = layout.header_row(),
                "header located: {:?}",
                layout
            );
            Ok(layout)
        }
        None => Err(BillingError::HeaderNotFound {
            workbook: workbook.to_string(),
            sheet: sheet.name().to_string(),
        }),
    }
}

/// Column map of `row` when it alone carries all three labels.
fn match_row(sheet: &Sheet, row: usize) -> Option<TargetColumns> {
    let mut matches = ColumnMatches::default();
    for col in 0..sheet.width() {
        let text = sheet.cell(row, col).normalized();
        if text.is_empty() {
            continue;
        }
        matches.offer(col, |label| label == text);
    }
    matches.complete()
}

/// Column map of the pair `(top, top + 1)`, matching each label against
/// either cell of a column or both cells joined by a space.
fn match_row_pair(sheet: &Sheet, top: usize) -> Option<TargetColumns> {
    let mut matches = ColumnMatches::default();
    for col in 0..sheet.width() {
        let upper = sheet.cell(top, col).normalized();
        let lower = sheet.cell(top + 1, col).normalized();
        if upper.is_empty() && lower.is_empty() {
            continue;
        }
        let joined = normalize_label(&format!("{upper} {lower}"));
        matches.offer(col, |label| {
            label == upper || label == lower || label == joined
        });
    }
    matches.complete()
}

fn find_single_row(sheet: &Sheet) -> Option<HeaderLayout> {
    (0..sheet.height()).find_map(|row| {
        match_row(sheet, row).map(|columns| HeaderLayout::SingleRow { row, columns })
    })
}

fn find_split_rows(sheet: &Sheet) -> Option<HeaderLayout> {
    (0..sheet.height()).find_map(|top| {
        // A complete single row at the top of the pair would swallow the
        // first data row if treated as a pair.
        if let Some(columns) = match_row(sheet, top) {
            return Some(HeaderLayout::SingleRow { row: top, columns });
        }
        match_row_pair(sheet, top).map(|columns| HeaderLayout::SplitRow { top, columns })
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
