use std::path::PathBuf;
use thiserror::Error;

/// Why a filename could not be mapped to an invoice category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationFailure {
    /// Neither "hospital" nor "professional" appears in the name.
    NoCategoryToken,
    /// Both tokens appear, so the category is ambiguous.
    BothCategoryTokens,
}

impl std::fmt::Display for ClassificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassificationFailure::NoCategoryToken => {
                f.write_str("filename contains neither \"Hospital\" nor \"Professional\"")
            }
            ClassificationFailure::BothCategoryTokens => {
                f.write_str("filename contains both \"Hospital\" and \"Professional\"")
            }
        }
    }
}

/// All errors produced by the billing consolidator.
#[derive(Error, Debug)]
pub enum BillingError {
    /// The workbook filename does not identify exactly one invoice category.
    #[error("Cannot classify workbook '{filename}': {reason}")]
    Classification {
        filename: String,
        reason: ClassificationFailure,
    },

    /// No header row (or row pair) with all three target labels was found.
    #[error("No 'Charge Amount' / 'Adjustment' / 'Balance Due' header in sheet '{sheet}' of '{workbook}'")]
    HeaderNotFound { workbook: String, sheet: String },

    /// Adding a sheet's amounts would exceed the range of `Decimal`.
    #[error("Amounts in sheet '{sheet}' of '{workbook}' overflow the running totals")]
    AmountOverflow { workbook: String, sheet: String },

    /// The workbook bytes could not be opened or a sheet could not be read.
    #[error("Failed to read workbook '{workbook}': {message}")]
    WorkbookRead { workbook: String, message: String },

    /// The consolidated report could not be rendered.
    #[error("Failed to build report: {0}")]
    Report(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input path given on the command line does not exist.
    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),

    /// No workbook files were found under the given path.
    #[error("No workbook files found in {0}")]
    NoWorkbooks(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to process JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BillingError {
    /// `true` for errors that abort a whole workbook rather than one sheet.
    pub fn is_workbook_fatal(&self) -> bool {
        !matches!(
            self,
            BillingError::HeaderNotFound { .. } | BillingError::AmountOverflow { .. }
        )
    }
}

/// Convenience alias used throughout the billing crates.
pub type Result<T> = std::result::Result<T, BillingError>;
