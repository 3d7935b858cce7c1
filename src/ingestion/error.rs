use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("{file}: required column {column} is missing from the header")]
    MissingColumn { file: String, column: String },

    #[error("{file} row {row}, column {column}: malformed percentage {value:?}")]
    MalformedPercentage {
        file: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{file}: spreadsheet error: {source}")]
    Spreadsheet {
        file: String,
        #[source]
        source: calamine::Error,
    },

    #[error("{file}: workbook contains no worksheets")]
    EmptyWorkbook { file: String },

    #[error("{file}: no header row found")]
    MissingHeader { file: String },

    #[error("{file}: CSV error: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file}: xlsx export error: {source}")]
    Xlsx {
        file: String,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("column layout changed between batches: expected {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

impl PrepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PrepResult<T> = Result<T, PrepError>;
