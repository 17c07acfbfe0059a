//! The consolidated xlsx report.
//!
//! Two sheets: **Summary** (one row per processed sheet) and **Combined
//! Data** (one row per extracted line). Currency columns are written as
//! numbers with an accounting format so the workbook stays computable.

use billing_core::error::{BillingError, Result};
use billing_core::models::AggregatedDataset;
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

pub const SUMMARY_SHEET: &str = "Summary";
pub const COMBINED_SHEET: &str = "Combined Data";

/// `(title, width)` of each Summary column.
pub const SUMMARY_COLUMNS: [(&str, f64); 7] = [
    ("Source Workbook", 40.0),
    ("Source Sheet", 24.0),
    ("Invoice Type", 14.0),
    ("Row Count", 11.0),
    ("Charge Amount", 16.0),
    ("Adjustment", 16.0),
    ("Balance Due", 16.0),
];

/// `(title, width)` of each Combined Data column.
pub const COMBINED_COLUMNS: [(&str, f64); 6] = [
    ("Charge Amount", 16.0),
    ("Adjustment", 16.0),
    ("Balance Due", 16.0),
    ("Source Sheet", 24.0),
    ("Source Workbook", 40.0),
    ("Invoice Type", 14.0),
];

/// Excel accounting format for US dollars.
pub const ACCOUNTING_FORMAT: &str = r#"_($* #,##0.00_);_($* (#,##0.00);_($* "-"??_);_(@_)"#;

const HEADER_FILL: u32 = 0xD9D9D9;

/// One value to write into a report cell.
enum Value<'a> {
    Text(&'a str),
    Count(usize),
    Money(Decimal),
}

struct Styles {
    header: Format,
    money: Format,
    plain: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(HEADER_FILL)),
            money: Format::new().set_num_format(ACCOUNTING_FORMAT),
            plain: Format::new(),
        }
    }
}

/// Render `dataset` into xlsx bytes.
///
/// An empty dataset still produces both sheets with their header rows.
pub fn build_report(dataset: &AggregatedDataset) -> Result<Vec<u8>> {
    render(dataset).map_err(report_error)
}

/// `{prefix}_report_{YYYYMMDD_HHMMSS}.xlsx`
pub fn report_filename(prefix: &str, timestamp: NaiveDateTime) -> String {
    format!("{}_report_{}.xlsx", prefix, timestamp.format("%Y%m%d_%H%M%S"))
}

fn report_error(e: XlsxError) -> BillingError {
    BillingError::Report(e.to_string())
}

fn render(dataset: &AggregatedDataset) -> std::result::Result<Vec<u8>, XlsxError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    summary.set_name(SUMMARY_SHEET)?;
    write_header(summary, &SUMMARY_COLUMNS, &styles)?;
    for (i, s) in dataset.summaries.iter().enumerate() {
        write_row(
            summary,
            i as u32 + 1,
            &[
                Value::Text(&s.source_workbook),
                Value::Text(&s.source_sheet),
                Value::Text(s.invoice_category.as_str()),
                Value::Count(s.row_count),
                Value::Money(s.charge_amount),
                Value::Money(s.adjustment),
                Value::Money(s.balance_due),
            ],
            &styles,
        )?;
    }
    finish_sheet(summary, dataset.summaries.len(), SUMMARY_COLUMNS.len())?;

    let combined = workbook.add_worksheet();
    combined.set_name(COMBINED_SHEET)?;
    write_header(combined, &COMBINED_COLUMNS, &styles)?;
    for (i, r) in dataset.rows.iter().enumerate() {
        write_row(
            combined,
            i as u32 + 1,
            &[
                Value::Money(r.charge_amount),
                Value::Money(r.adjustment),
                Value::Money(r.balance_due),
                Value::Text(&r.source_sheet),
                Value::Text(&r.source_workbook),
                Value::Text(r.invoice_category.as_str()),
            ],
            &styles,
        )?;
    }
    finish_sheet(combined, dataset.rows.len(), COMBINED_COLUMNS.len())?;

    debug!(
        summaries = dataset.summaries.len(),
        rows = dataset.rows.len(),
        "report rendered"
    );
    workbook.save_to_buffer()
}

fn write_header(
    worksheet: &mut Worksheet,
    columns: &[(&str, f64)],
    styles: &Styles,
) -> std::result::Result<(), XlsxError> {
    for (col, (title, width)) in columns.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
        worksheet.write_string_with_format(0, col as u16, *title, &styles.header)?;
    }
    Ok(())
}

fn write_row(
    worksheet: &mut Worksheet,
    row: u32,
    values: &[Value<'_>],
    styles: &Styles,
) -> std::result::Result<(), XlsxError> {
    for (col, value) in values.iter().enumerate() {
        let col = col as u16;
        match value {
            Value::Text(text) => {
                worksheet.write_string_with_format(row, col, *text, &styles.plain)?;
            }
            Value::Count(n) => {
                worksheet.write_number_with_format(row, col, *n as f64, &styles.plain)?;
            }
            Value::Money(amount) => {
                let number = amount.to_f64().unwrap_or_default();
                worksheet.write_number_with_format(row, col, number, &styles.money)?;
            }
        }
    }
    Ok(())
}

/// Freeze the header row and put an autofilter over the written range.
fn finish_sheet(
    worksheet: &mut Worksheet,
    data_rows: usize,
    columns: usize,
) -> std::result::Result<(), XlsxError> {
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofilter(0, 0, data_rows as u32, columns as u16 - 1)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::models::{ExtractedRow, SheetMetadata, SheetSummary};
    use billing_core::InvoiceCategory;
    use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn row(charge: i64, adjustment: i64, balance: i64) -> ExtractedRow {
        ExtractedRow {
            charge_amount: Decimal::new(charge, 2),
            adjustment: Decimal::new(adjustment, 2),
            balance_due: Decimal::new(balance, 2),
            source_sheet: "Inv 1".to_string(),
            source_workbook: "May Hospital.xlsx".to_string(),
            invoice_category: InvoiceCategory::Hospital,
        }
    }

    fn dataset() -> AggregatedDataset {
        AggregatedDataset {
            rows: vec![row(10_000, 1_000, 9_000), row(5_000, 0, 5_000)],
            summaries: vec![SheetSummary {
                source_sheet: "Inv 1".to_string(),
                source_workbook: "May Hospital.xlsx".to_string(),
                invoice_category: InvoiceCategory::Hospital,
                row_count: 2,
                charge_amount: Decimal::new(15_000, 2),
                adjustment: Decimal::new(1_000, 2),
                balance_due: Decimal::new(14_000, 2),
                invoice_date: None,
                metadata: SheetMetadata::default(),
                scanned_rows: 2,
            }],
        }
    }

    fn read_back(bytes: Vec<u8>) -> (Vec<String>, Range<Data>, Range<Data>) {
        let mut book = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let names = book.sheet_names();
        let summary = book.worksheet_range(SUMMARY_SHEET).unwrap();
        let combined = book.worksheet_range(COMBINED_SHEET).unwrap();
        (names, summary, combined)
    }

    fn text(range: &Range<Data>, pos: (u32, u32)) -> String {
        match range.get_value(pos) {
            Some(Data::String(s)) => s.clone(),
            other => panic!("expected text at {pos:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_report_has_two_sheets_in_order() {
        let (names, _, _) = read_back(build_report(&dataset()).unwrap());
        assert_eq!(names, vec![SUMMARY_SHEET, COMBINED_SHEET]);
    }

    #[test]
    fn test_summary_sheet_columns_and_values() {
        let (_, summary, _) = read_back(build_report(&dataset()).unwrap());
        for (col, (title, _)) in SUMMARY_COLUMNS.iter().enumerate() {
            assert_eq!(text(&summary, (0, col as u32)), *title);
        }
        assert_eq!(text(&summary, (1, 0)), "May Hospital.xlsx");
        assert_eq!(text(&summary, (1, 2)), "Hospital");
        assert_eq!(summary.get_value((1, 3)), Some(&Data::Float(2.0)));
        assert_eq!(summary.get_value((1, 4)), Some(&Data::Float(150.0)));
        assert_eq!(summary.get_value((1, 6)), Some(&Data::Float(140.0)));
    }

    #[test]
    fn test_combined_sheet_currency_cells_are_numeric() {
        let (_, _, combined) = read_back(build_report(&dataset()).unwrap());
        for (col, (title, _)) in COMBINED_COLUMNS.iter().enumerate() {
            assert_eq!(text(&combined, (0, col as u32)), *title);
        }
        assert_eq!(combined.get_value((1, 0)), Some(&Data::Float(100.0)));
        assert_eq!(combined.get_value((1, 1)), Some(&Data::Float(10.0)));
        assert_eq!(combined.get_value((2, 2)), Some(&Data::Float(50.0)));
        assert_eq!(text(&combined, (2, 3)), "Inv 1");
        assert_eq!(text(&combined, (2, 5)), "Hospital");
    }

    #[test]
    fn test_negative_amounts_survive() {
        let mut data = dataset();
        data.rows = vec![row(-2_550, -100, -2_450)];
        let (_, _, combined) = read_back(build_report(&data).unwrap());
        assert_eq!(combined.get_value((1, 0)), Some(&Data::Float(-25.5)));
    }

    #[test]
    fn test_empty_dataset_still_has_headers() {
        let (names, summary, combined) = read_back(build_report(&AggregatedDataset::default()).unwrap());
        assert_eq!(names.len(), 2);
        assert_eq!(text(&summary, (0, 0)), "Source Workbook");
        assert_eq!(text(&combined, (0, 0)), "Charge Amount");
        assert_eq!(summary.get_value((1, 0)), None);
    }

    #[test]
    fn test_report_filename() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 30)
            .unwrap();
        assert_eq!(
            report_filename("billing", ts),
            "billing_report_20250307_090530.xlsx"
        );
    }
}
