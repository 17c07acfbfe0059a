//! Table extraction, value normalization and provenance tagging.
//!
//! [`extract_rows`] walks the rows below a detected header and stops at the
//! first terminator; [`normalize`] turns a raw row into parsed amounts or
//! drops it; [`tag`] attaches provenance.

use billing_core::currency::parse_currency;
use billing_core::models::{Amounts, ExtractedRow, Provenance};

use crate::layout::{HeaderLayout, TargetColumns};
use crate::sheet::{Cell, Sheet};

/// Footer text that marks the end of a table (lower case).
pub const TABLE_END_MARKERS: [&str; 2] = ["total amount due", "balance this statement"];

// ── RawRow ────────────────────────────────────────────────────────────────────

/// The three target cells of one table row, as found in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow<'a> {
    /// Absolute zero-based row index within the sheet.
    pub row_index: usize,
    pub charge_amount: &'a Cell,
    pub adjustment: &'a Cell,
    pub balance_due: &'a Cell,
}

// ── RowIter ───────────────────────────────────────────────────────────────────

/// Lazy, single-pass iterator over the rows of one table.
#[derive(Debug)]
pub struct RowIter<'a> {
    sheet: &'a Sheet,
    columns: TargetColumns,
    next_row: usize,
    finished: bool,
}

impl<'a> RowIter<'a> {
    /// Row index the iterator will inspect next.
    pub fn position(&self) -> usize {
        self.next_row
    }

    fn is_terminator(&self, row: usize) -> bool {
        if self.sheet.is_row_empty_in(row, self.columns.span()) {
            return true;
        }
        (0..=self.columns.last()).any(|col| is_end_marker(self.sheet.cell(row, col)))
    }
}

impl<'a> Iterator for RowIter<'a> {
    type Item = RawRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let row = self.next_row;
        if row >= self.sheet.height() || self.is_terminator(row) {
            self.finished = true;
            return None;
        }
        self.next_row += 1;

        let sheet = self.sheet;
        Some(RawRow {
            row_index: row,
            charge_amount: sheet.cell(row, self.columns.charge_amount),
            adjustment: sheet.cell(row, self.columns.adjustment),
            balance_due: sheet.cell(row, self.columns.balance_due),
        })
    }
}

impl std::iter::FusedIterator for RowIter<'_> {}

/// Iterate the table rows below `layout`'s header.
///
/// The table ends (terminating row excluded) at the first row that is empty
/// across the table's column span, at the first row whose leading cells
/// contain a [`TABLE_END_MARKERS`] entry, or at the end of the sheet.
pub fn extract_rows<'a>(sheet: &'a Sheet, layout: &HeaderLayout) -> RowIter<'a> {
    RowIter {
        sheet,
        columns: *layout.columns(),
        next_row: layout.data_start(),
        finished: false,
    }
}

/// `true` when `cell` contains one of the end-of-table markers.
pub fn is_end_marker(cell: &Cell) -> bool {
    let text = cell.normalized();
    !text.is_empty() && TABLE_END_MARKERS.iter().any(|marker| text.contains(marker))
}

// ── Normalization ─────────────────────────────────────────────────────────────

/// Parse the three target cells. Any blank or unparsable field drops the row.
pub fn normalize(raw: &RawRow<'_>) -> Option<Amounts> {
    Some(Amounts {
        charge_amount: parse_currency(raw.charge_amount.text()?)?,
        adjustment: parse_currency(raw.adjustment.text()?)?,
        balance_due: parse_currency(raw.balance_due.text()?)?,
    })
}

/// Attach provenance to parsed amounts.
pub fn tag(amounts: Amounts, provenance: &Provenance) -> ExtractedRow {
    ExtractedRow {
        charge_amount: amounts.charge_amount,
        adjustment: amounts.adjustment,
        balance_due: amounts.balance_due,
        source_sheet: provenance.source_sheet.clone(),
        source_workbook: provenance.source_workbook.clone(),
        invoice_category: provenance.invoice_category,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::detect_header;
    use billing_core::InvoiceCategory;
    use rust_decimal::Decimal;

    fn single_row_layout(row: usize) -> HeaderLayout {
        HeaderLayout::SingleRow {
            row,
            columns: TargetColumns {
                charge_amount: 1,
                adjustment: 2,
                balance_due: 3,
            },
        }
    }

    fn texts(rows: Vec<RawRow<'_>>) -> Vec<Vec<String>> {
        rows.into_iter()
            .map(|r| {
                [r.charge_amount, r.adjustment, r.balance_due]
                    .iter()
                    .map(|c| c.text().unwrap_or("").to_string())
                    .collect()
            })
            .collect()
    }

    // ── extract_rows ──────────────────────────────────────────────────────────

    #[test]
    fn test_extract_stops_at_empty_row() {
        let sheet = Sheet::from_text_rows(
            "S",
            &[
                &["Desc", "Charge Amount", "Adjustment", "Balance Due"],
                &["a", "$100.00", "$10.00", "$90.00"],
                &["b", "$50", "$0", "$50"],
                &[],
                &["c", "$1", "$1", "$1"],
            ],
        );
        let rows: Vec<_> = extract_rows(&sheet, &single_row_layout(0)).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_index, 1);
        assert_eq!(rows[1].row_index, 2);
    }

    #[test]
    fn test_extract_row_blank_in_span_but_text_outside_terminates() {
        let sheet = Sheet::from_text_rows(
            "S",
            &[
                &["Desc", "Charge Amount", "Adjustment", "Balance Due"],
                &["a", "1", "2", "3"],
                &["note only", "", "", ""],
                &["b", "4", "5", "6"],
            ],
        );
        let rows: Vec<_> = extract_rows(&sheet, &single_row_layout(0)).collect();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_extract_stops_at_total_amount_due() {
        let sheet = Sheet::from_text_rows(
            "S",
            &[
                &["Desc", "Charge Amount", "Adjustment", "Balance Due"],
                &["a", "$100.00", "$10.00", "$90.00"],
                &["TOTAL AMOUNT DUE", "$100.00", "$10.00", "$90.00"],
            ],
        );
        let rows: Vec<_> = extract_rows(&sheet, &single_row_layout(0)).collect();
        assert_eq!(texts(rows), vec![vec!["$100.00", "$10.00", "$90.00"]]);
    }

    #[test]
    fn test_extract_stops_at_balance_this_statement_substring() {
        let sheet = Sheet::from_text_rows(
            "S",
            &[
                &["Desc", "Charge Amount", "Adjustment", "Balance Due"],
                &["a", "1", "1", "1"],
                &["", "  Balance This Statement:  ", "", "$5.00"],
            ],
        );
        let rows: Vec<_> = extract_rows(&sheet, &single_row_layout(0)).collect();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_extract_runs_to_end_of_sheet() {
        let sheet = Sheet::from_text_rows(
            "S",
            &[
                &["Desc", "Charge Amount", "Adjustment", "Balance Due"],
                &["a", "1", "1", "1"],
                &["b", "2", "2", "2"],
            ],
        );
        let mut iter = extract_rows(&sheet, &single_row_layout(0));
        assert_eq!(iter.by_ref().count(), 2);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.position(), 3);
    }

    #[test]
    fn test_extract_header_on_last_row_yields_nothing() {
        let sheet = Sheet::from_text_rows("S", &[&["Desc", "Charge Amount", "Adjustment", "Balance Due"]]);
        assert_eq!(extract_rows(&sheet, &single_row_layout(0)).count(), 0);
    }

    #[test]
    fn test_extract_after_split_header() {
        let sheet = Sheet::from_text_rows(
            "P",
            &[
                &["Svc", "Charge Amount", "Payments and", "Balance"],
                &["", "", "Adjustment", "Due"],
                &["x", "$20", "-$5", "$15"],
            ],
        );
        let layout = detect_header(&sheet, InvoiceCategory::Professional, "wb").unwrap();
        let rows: Vec<_> = extract_rows(&sheet, &layout).collect();
        assert_eq!(texts(rows), vec![vec!["$20", "-$5", "$15"]]);
    }

    #[test]
    fn test_end_marker_matching() {
        assert!(is_end_marker(&Cell::from_text("TOTAL AMOUNT DUE")));
        assert!(is_end_marker(&Cell::from_text("total  amount due:")));
        assert!(!is_end_marker(&Cell::from_text("Total")));
        assert!(!is_end_marker(&Cell::Empty));
    }

    // ── normalize / tag ───────────────────────────────────────────────────────

    #[test]
    fn test_normalize_complete_row() {
        let (a, b, c) = (
            Cell::from_text("$1,000.50"),
            Cell::from_text("-$0.50"),
            Cell::from_text("1000"),
        );
        let raw = RawRow {
            row_index: 0,
            charge_amount: &a,
            adjustment: &b,
            balance_due: &c,
        };
        let amounts = normalize(&raw).unwrap();
        assert_eq!(amounts.charge_amount, Decimal::new(100_050, 2));
        assert_eq!(amounts.adjustment, Decimal::new(-50, 2));
        assert_eq!(amounts.balance_due, Decimal::new(1000, 0));
    }

    #[test]
    fn test_normalize_drops_blank_field() {
        let (a, c) = (Cell::from_text("$50"), Cell::from_text("$50"));
        let raw = RawRow {
            row_index: 0,
            charge_amount: &a,
            adjustment: &Cell::Empty,
            balance_due: &c,
        };
        assert_eq!(normalize(&raw), None);
    }

    #[test]
    fn test_normalize_drops_unparsable_field() {
        let (a, b, c) = (
            Cell::from_text("$50"),
            Cell::from_text("pending"),
            Cell::from_text("$50"),
        );
        let raw = RawRow {
            row_index: 0,
            charge_amount: &a,
            adjustment: &b,
            balance_due: &c,
        };
        assert_eq!(normalize(&raw), None);
    }

    #[test]
    fn test_tag_attaches_provenance() {
        let provenance = Provenance::new("May Hospital.xlsx", "Inv 7", InvoiceCategory::Hospital);
        let amounts = Amounts {
            charge_amount: Decimal::new(1, 0),
            adjustment: Decimal::ZERO,
            balance_due: Decimal::new(1, 0),
        };
        let row = tag(amounts, &provenance);
        assert_eq!(row.source_workbook, "May Hospital.xlsx");
        assert_eq!(row.source_sheet, "Inv 7");
        assert_eq!(row.invoice_category, InvoiceCategory::Hospital);
        assert_eq!(row.amounts(), amounts);
    }
}
