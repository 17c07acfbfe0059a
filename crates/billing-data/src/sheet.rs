//! Typed, read-only view of one worksheet.
//!
//! Cells are addressed by absolute zero-based `(row, column)` positions.
//! Lookups outside the used area return [`Cell::Empty`], so callers never
//! have to distinguish "missing" from "blank".

use calamine::{Data, Range};

/// A single cell value: either blank or non-blank text.
///
/// Numbers, dates and booleans are rendered to text on ingest; text that is
/// empty after trimming is stored as [`Cell::Empty`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Build a cell from text, collapsing whitespace-only strings to `Empty`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The raw text, or `None` for an empty cell.
    pub fn text(&self) -> Option<&str> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s),
        }
    }

    /// Trimmed, lower-cased text with internal whitespace collapsed to one
    /// space. Empty cells normalize to `""`.
    pub fn normalized(&self) -> String {
        self.text().map(normalize_label).unwrap_or_default()
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::String(v) => Cell::from_text(v.as_str()),
            Data::Float(v) => Cell::Text(v.to_string()),
            Data::Int(v) => Cell::Text(v.to_string()),
            Data::Bool(v) => Cell::Text(v.to_string()),
            Data::DateTime(v) => Cell::Text(v.to_string()),
            Data::DateTimeIso(v) => Cell::from_text(v.as_str()),
            Data::DurationIso(v) => Cell::from_text(v.as_str()),
            Data::Error(v) => Cell::Text(format!("{v:?}")),
            Data::Empty => Cell::Empty,
        }
    }
}

/// Lower-case `text`, trim it and collapse runs of whitespace.
pub fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One worksheet: a name and a bounded grid of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Sheet {
    /// Build a sheet from row-major cells. Rows may have different lengths.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            name: name.into(),
            rows,
            width,
        }
    }

    /// Convenience constructor from string slices; `""` becomes an empty cell.
    pub fn from_text_rows(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let cells = rows
            .iter()
            .map(|row| row.iter().map(|s| Cell::from_text(*s)).collect())
            .collect();
        Self::new(name, cells)
    }

    /// Convert a calamine range, keeping absolute sheet coordinates.
    ///
    /// calamine ranges start at the first used cell; leading rows and columns
    /// are re-inserted as empty cells so that row/column indices match the
    /// worksheet.
    pub fn from_range(name: impl Into<String>, range: &Range<Data>) -> Self {
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
        for source_row in range.rows() {
            let mut row = vec![Cell::Empty; col_offset];
            row.extend(source_row.iter().map(Cell::from));
            rows.push(row);
        }

        Self::new(name, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows in the grid.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the widest row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// `true` when no cell holds text.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Cell::is_empty))
    }

    /// Bounded lookup; out-of-range positions are empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// `true` when every cell in `cols` of `row` is empty.
    pub fn is_row_empty_in(&self, row: usize, cols: std::ops::RangeInclusive<usize>) -> bool {
        cols.into_iter().all(|col| self.cell(row, col).is_empty())
    }
}
