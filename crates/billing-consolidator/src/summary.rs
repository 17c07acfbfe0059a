//! Plain-text run summary printed after a consolidation.

use std::fmt::Write as _;

use billing_core::formatting::{fit_column, format_currency};
use billing_core::models::SheetSummary;
use billing_data::ConsolidationOutcome;

/// `(title, width)` of each console column.
const COLUMNS: [(&str, usize); 7] = [
    ("Workbook", 34),
    ("Sheet", 18),
    ("Type", 12),
    ("Rows", 6),
    ("Charge Amount", 16),
    ("Adjustment", 16),
    ("Balance Due", 16),
];

/// Render the per-sheet table, totals, skipped sheets and failed workbooks.
pub fn render(outcome: &ConsolidationOutcome) -> String {
    let mut out = String::new();

    push_line(&mut out, COLUMNS.map(|(title, _)| title.to_string()));
    let rule_width = COLUMNS.iter().map(|(_, w)| w + 1).sum::<usize>() - 1;
    let _ = writeln!(out, "{}", "─".repeat(rule_width));

    for summary in &outcome.dataset.summaries {
        push_line(&mut out, summary_cells(summary));
    }

    let totals = outcome.dataset.totals();
    let _ = writeln!(out, "{}", "─".repeat(rule_width));
    push_line(
        &mut out,
        [
            format!("{} workbook(s)", totals.workbooks),
            format!("{} sheet(s)", totals.sheets),
            String::new(),
            totals.rows.to_string(),
            format_currency(totals.charge_amount),
            format_currency(totals.adjustment),
            format_currency(totals.balance_due),
        ],
    );

    if !outcome.warnings.is_empty() {
        let _ = writeln!(out, "\nSkipped sheets:");
        for w in &outcome.warnings {
            let _ = writeln!(out, "  {} / {}: {}", w.workbook, w.sheet, w.reason);
        }
    }
    if !outcome.failures.is_empty() {
        let _ = writeln!(out, "\nFailed workbooks:");
        for f in &outcome.failures {
            let _ = writeln!(out, "  {}: {}", f.workbook, f.reason);
        }
    }

    out
}

fn summary_cells(summary: &SheetSummary) -> [String; 7] {
    [
        summary.source_workbook.clone(),
        summary.source_sheet.clone(),
        summary.invoice_category.to_string(),
        summary.row_count.to_string(),
        format_currency(summary.charge_amount),
        format_currency(summary.adjustment),
        format_currency(summary.balance_due),
    ]
}

fn push_line(out: &mut String, cells: [String; 7]) {
    let line: Vec<String> = cells
        .iter()
        .zip(COLUMNS.iter())
        .map(|(cell, (_, width))| fit_column(cell, *width))
        .collect();
    let _ = writeln!(out, "{}", line.join(" ").trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::models::{
        AggregatedDataset, SheetMetadata, SkipWarning, WorkbookFailure,
    };
    use billing_core::InvoiceCategory;
    use rust_decimal::Decimal;

    fn outcome() -> ConsolidationOutcome {
        ConsolidationOutcome {
            dataset: AggregatedDataset {
                rows: Vec::new(),
                summaries: vec![SheetSummary {
                    source_sheet: "Inv 1".to_string(),
                    source_workbook: "May Hospital.xlsx".to_string(),
                    invoice_category: InvoiceCategory::Hospital,
                    row_count: 2,
                    charge_amount: Decimal::new(150_000, 2),
                    adjustment: Decimal::new(-1_000, 2),
                    balance_due: Decimal::new(149_000, 2),
                    invoice_date: None,
                    metadata: SheetMetadata::default(),
                    scanned_rows: 2,
                }],
            },
            warnings: vec![SkipWarning {
                workbook: "May Hospital.xlsx".to_string(),
                sheet: "Notes".to_string(),
                reason: "sheet is empty".to_string(),
            }],
            failures: vec![WorkbookFailure {
                workbook: "Q1_invoices.xlsx".to_string(),
                reason: "Cannot classify".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_contains_rows_and_totals() {
        let text = render(&outcome());
        assert!(text.starts_with("Workbook"));
        assert!(text.contains("May Hospital.xlsx"));
        assert!(text.contains("$1,500.00"));
        assert!(text.contains("-$10.00"));
        assert!(text.contains("1 workbook(s)"));
    }

    #[test]
    fn test_render_lists_warnings_and_failures() {
        let text = render(&outcome());
        assert!(text.contains("Skipped sheets:\n  May Hospital.xlsx / Notes: sheet is empty"));
        assert!(text.contains("Failed workbooks:\n  Q1_invoices.xlsx: Cannot classify"));
    }

    #[test]
    fn test_render_empty_outcome_has_no_sections() {
        let text = render(&ConsolidationOutcome::default());
        assert!(text.contains("0 workbook(s)"));
        assert!(!text.contains("Skipped"));
        assert!(!text.contains("Failed"));
    }
}
