//! Label/value metadata printed above an invoice table.
//!
//! Hospital sheets carry labels in column B with values in column C;
//! Professional sheets use columns A and B. Only rows above the header are
//! scanned and fields that never appear stay blank.

use billing_core::models::SheetMetadata;
use billing_core::InvoiceCategory;

use crate::sheet::{normalize_label, Sheet};

/// A metadata field recognised above the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Pi,
    StudyName,
    StudyCode,
    IrbNo,
    KfsNo,
}

const HOSPITAL_FIELDS: &[(&str, Field)] = &[
    ("pi", Field::Pi),
    ("study name", Field::StudyName),
    ("irb no", Field::IrbNo),
    ("kfs no", Field::KfsNo),
];

const PROFESSIONAL_FIELDS: &[(&str, Field)] = &[
    ("pi", Field::Pi),
    ("study name", Field::StudyName),
    ("study code", Field::StudyCode),
    ("irb no", Field::IrbNo),
    ("kfs no", Field::KfsNo),
];

/// `(label column, value column, recognised fields)` for a category.
fn layout_for(category: InvoiceCategory) -> (usize, usize, &'static [(&'static str, Field)]) {
    match category {
        InvoiceCategory::Hospital => (1, 2, HOSPITAL_FIELDS),
        InvoiceCategory::Professional => (0, 1, PROFESSIONAL_FIELDS),
    }
}

/// Normalize a metadata label: lower-case, collapse whitespace and strip
/// trailing punctuation, so `"KFS NO.:"` reads as `"kfs no"`.
pub fn normalize_metadata_label(text: &str) -> String {
    let normalized = normalize_label(text);
    normalized
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// Collect metadata from the rows strictly above `header_row`.
///
/// When a label appears more than once, the lowest row wins.
pub fn extract_metadata(sheet: &Sheet, category: InvoiceCategory, header_row: usize) -> SheetMetadata {
    let (label_col, value_col, fields) = layout_for(category);
    let mut metadata = SheetMetadata::default();

    for row in 0..header_row.min(sheet.height()) {
        let Some(label) = sheet.cell(row, label_col).text() else {
            continue;
        };
        let label = normalize_metadata_label(label);
        let Some(&(_, field)) = fields.iter().find(|(name, _)| *name == label) else {
            continue;
        };
        let value = sheet
            .cell(row, value_col)
            .text()
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        let slot = match field {
            Field::Pi => &mut metadata.pi,
            Field::StudyName => &mut metadata.study_name,
            Field::StudyCode => &mut metadata.study_code,
            Field::IrbNo => &mut metadata.irb_no,
            Field::KfsNo => &mut metadata.kfs_no,
        };
        *slot = value;
    }

    metadata
}
