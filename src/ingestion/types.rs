//! Core data types for the ingestion pipeline
//! Pure data structures with no behavior beyond accessors

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Name of the provenance column appended to every row
pub const YEAR_COLUMN: &str = "YEAR";

/// School identifier column
pub const URN_COLUMN: &str = "URN";

/// National grouping column
pub const RECTYPE_COLUMN: &str = "RECTYPE";

/// Spreadsheet formats the decode boundary understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook, // xlsx, xlsm, xls, ods via calamine
    Csv,
}

/// A dated datafile found in the input directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub year: String,
    pub format: SourceFormat,
}

/// One decoded datafile: every cell arrives as a string
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Position of a column in the header (first occurrence wins)
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|h| h == column)
    }
}

/// Normalized cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Null,
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Null => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Per-file processing statistics
#[derive(Debug, Default, Clone)]
pub struct FileStats {
    pub file: String,
    pub year: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub null_cells: usize,
}

impl fmt::Display for FileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): read: {}, kept: {}, null cells: {}",
            self.file, self.year, self.rows_read, self.rows_kept, self.null_cells
        )
    }
}

/// Whole-run statistics
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub files: Vec<FileStats>,
    pub rows_written: usize,
    pub unmatched_urns: BTreeSet<String>,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files: {}, rows written: {}, unmatched URNs: {}",
            self.files.len(),
            self.rows_written,
            self.unmatched_urns.len()
        )
    }
}
