//! Workbook discovery and loading.
//!
//! Finds spreadsheet files on disk, reads their bytes into
//! [`WorkbookInput`]s and opens in-memory workbooks into [`Sheet`]s with
//! calamine.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use billing_core::error::{BillingError, Result};
use calamine::{open_workbook_auto_from_rs, Reader};
use tracing::{debug, warn};

use crate::sheet::Sheet;

/// File extensions treated as workbooks (lower case).
pub const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Prefix of the lock files spreadsheet editors leave next to open workbooks.
const LOCK_FILE_PREFIX: &str = "~$";

/// One uploaded workbook: its display filename and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl WorkbookInput {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// `true` when `path` looks like a workbook and is not an editor lock file.
pub fn is_workbook_file(path: &Path) -> bool {
    let is_lock = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(LOCK_FILE_PREFIX))
        .unwrap_or(false);
    if is_lock {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| WORKBOOK_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Find all workbook files recursively under `dir`, sorted by path.
pub fn find_workbook_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Input path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_workbook_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand command-line inputs into workbook paths, keeping argument order.
///
/// Files are taken as given; directories are searched recursively. A missing
/// path or a directory with no workbooks is an error.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(BillingError::InputNotFound(path.clone()));
        }
        if path.is_dir() {
            let found = find_workbook_files(path);
            if found.is_empty() {
                return Err(BillingError::NoWorkbooks(path.clone()));
            }
            debug!("Found {} workbooks in {}", found.len(), path.display());
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Read every file into memory, naming each input by its file name.
pub fn load_inputs(paths: &[PathBuf]) -> Result<Vec<WorkbookInput>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path).map_err(|source| BillingError::FileRead {
                path: path.clone(),
                source,
            })?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(WorkbookInput::new(filename, bytes))
        })
        .collect()
}

// ── Opening ───────────────────────────────────────────────────────────────────

/// Open an in-memory workbook and return its sheets in tab order.
///
/// `workbook` only labels errors. Any sheet that cannot be read fails the
/// whole workbook.
pub fn open_workbook(workbook: &str, bytes: &[u8]) -> Result<Vec<Sheet>> {
    let read_error = |message: String| BillingError::WorkbookRead {
        workbook: workbook.to_string(),
        message,
    };

    let mut book = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| read_error(e.to_string()))?;

    let names = book.sheet_names();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = book
            .worksheet_range(&name)
            .map_err(|e| read_error(format!("sheet '{name}': {e}")))?;
        sheets.push(Sheet::from_range(name, &range));
    }

    debug!("Opened '{}' with {} sheets", workbook, sheets.len());
    Ok(sheets)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
