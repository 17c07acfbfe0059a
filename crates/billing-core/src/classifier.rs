//! Filename-based classification of invoice workbooks.
//!
//! The invoice category and the invoice month are both carried only by the
//! workbook's filename, e.g. `"AZCC May 2025 Banner Hospital Invoices.xlsx"`.

use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{BillingError, ClassificationFailure, Result};
use crate::models::InvoiceCategory;

/// Determine the invoice category from a workbook filename.
///
/// Only the final path component is inspected. Exactly one of the tokens
/// `"hospital"` / `"professional"` must occur (case-insensitive).
pub fn classify(filename: &str) -> Result<InvoiceCategory> {
    let lowered = file_name_of(filename).to_lowercase();
    let hospital = lowered.contains(InvoiceCategory::Hospital.filename_token());
    let professional = lowered.contains(InvoiceCategory::Professional.filename_token());

    match (hospital, professional) {
        (true, false) => Ok(InvoiceCategory::Hospital),
        (false, true) => Ok(InvoiceCategory::Professional),
        (false, false) => Err(BillingError::Classification {
            filename: filename.to_string(),
            reason: ClassificationFailure::NoCategoryToken,
        }),
        (true, true) => Err(BillingError::Classification {
            filename: filename.to_string(),
            reason: ClassificationFailure::BothCategoryTokens,
        }),
    }
}

/// Parse `"<month> <year>"` from a workbook filename into the first day of
/// that month. Returns `None` when no month/year pair is present.
///
/// ```
/// use billing_core::classifier::invoice_date_from_filename;
/// use chrono::NaiveDate;
///
/// assert_eq!(
///     invoice_date_from_filename("AZCC Sept 2025 Professional.xlsx"),
///     NaiveDate::from_ymd_opt(2025, 9, 1)
/// );
/// assert_eq!(invoice_date_from_filename("Hospital.xlsx"), None);
/// ```
pub fn invoice_date_from_filename(filename: &str) -> Option<NaiveDate> {
    let captures = invoice_date_pattern().captures(file_name_of(filename))?;
    let month = month_number(&captures[1].to_lowercase())?;
    let year: i32 = captures[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn file_name_of(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename)
}

fn invoice_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Longer names first so "sept" is not cut short to "sep". Underscores
        // and digits count as separators around the month and year.
        Regex::new(
            r"(?i)(?:^|[^a-z])(january|february|march|april|may|june|july|august|september|october|november|december|sept|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec)\s+(\d{4})(?:[^0-9]|$)",
        )
        .expect("regex is valid")
    })
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── classify ──────────────────────────────────────────────────────────────

    #[test]
    fn test_classify_hospital() {
        let category = classify("AZCC May 2025 Banner Hospital Invoices.xlsx").unwrap();
        assert_eq!(category, InvoiceCategory::Hospital);
    }

    #[test]
    fn test_classify_professional_case_insensitive() {
        let category = classify("june 2025 PROFESSIONAL invoices.xlsx").unwrap();
        assert_eq!(category, InvoiceCategory::Professional);
    }

    #[test]
    fn test_classify_neither_token_fails() {
        let err = classify("Q1_invoices.xlsx").unwrap_err();
        match err {
            BillingError::Classification { filename, reason } => {
                assert_eq!(filename, "Q1_invoices.xlsx");
                assert_eq!(reason, ClassificationFailure::NoCategoryToken);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_classify_both_tokens_fails() {
        let err = classify("Hospital vs Professional.xlsx").unwrap_err();
        assert!(matches!(
            err,
            BillingError::Classification {
                reason: ClassificationFailure::BothCategoryTokens,
                ..
            }
        ));
    }

    #[test]
    fn test_classify_ignores_directory_names() {
        let category = classify("/uploads/hospital/May Professional.xlsx").unwrap();
        assert_eq!(category, InvoiceCategory::Professional);
    }

    // ── invoice_date_from_filename ────────────────────────────────────────────

    #[test]
    fn test_invoice_date_full_month() {
        assert_eq!(
            invoice_date_from_filename("AZCC May 2025 Banner Hospital Invoices.xlsx"),
            NaiveDate::from_ymd_opt(2025, 5, 1)
        );
    }

    #[test]
    fn test_invoice_date_abbreviations() {
        assert_eq!(
            invoice_date_from_filename("Sep 2024 Hospital.xlsx"),
            NaiveDate::from_ymd_opt(2024, 9, 1)
        );
        assert_eq!(
            invoice_date_from_filename("Sept 2024 Hospital.xlsx"),
            NaiveDate::from_ymd_opt(2024, 9, 1)
        );
        assert_eq!(
            invoice_date_from_filename("DEC 2023 Professional.xlsx"),
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
    }

    #[test]
    fn test_invoice_date_missing() {
        assert_eq!(invoice_date_from_filename("Hospital Invoices.xlsx"), None);
        assert_eq!(invoice_date_from_filename("Hospital 2025.xlsx"), None);
    }

    #[test]
    fn test_invoice_date_underscore_separated() {
        assert_eq!(
            invoice_date_from_filename("AZCC_Sept 2025_Banner_Hospital.xlsx"),
            NaiveDate::from_ymd_opt(2025, 9, 1)
        );
        assert_eq!(
            invoice_date_from_filename("invoices_may 2024.xlsx"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }

    #[test]
    fn test_invoice_date_year_must_be_four_digits() {
        assert_eq!(invoice_date_from_filename("May 20251 Hospital.xlsx"), None);
    }

    #[test]
    fn test_invoice_date_requires_word_boundary() {
        // "Summary 2025" must not be read as "mar 2025".
        assert_eq!(invoice_date_from_filename("Hospital Summary 2025.xlsx"), None);
    }
}
