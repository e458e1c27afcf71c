use thiserror::Error;

/// A file could not be read into a table. Terminal for that file only: the
/// rest of the batch keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no columns to parse from file")]
    Empty,
    #[error("malformed CSV: {0}")]
    Csv(String),
    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("invalid table: {0}")]
    Shape(String),
}

/// Errors raised by the stages after loading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    #[error("unsupported file type '{0}' (expected .csv or .xlsx)")]
    UnsupportedUpload(String),
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("column '{column}' has {len} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        len: usize,
        expected: usize,
    },
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("CSV export failed: {0}")]
    CsvWrite(String),
    #[error("Excel export failed: {0}")]
    XlsxWrite(String),
    #[error("archive failed: {0}")]
    Archive(String),
    #[error("duplicate archive entry '{0}'")]
    DuplicateEntry(String),
}

impl From<csv::Error> for SweepError {
    fn from(e: csv::Error) -> Self {
        SweepError::CsvWrite(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SweepError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        SweepError::XlsxWrite(e.to_string())
    }
}

impl From<zip::result::ZipError> for SweepError {
    fn from(e: zip::result::ZipError) -> Self {
        SweepError::Archive(e.to_string())
    }
}
