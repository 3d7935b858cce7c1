//! Write functions - accumulate normalized rows and export the merged dataset

use crate::ingestion::error::{PrepError, PrepResult};
use crate::ingestion::types::{Cell, SourceFormat};
use crate::ingestion::utils::source_format;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Rows from every processed file, in processing order.
/// The column layout is fixed at construction and only ever appended to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Dataset {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a batch of rows sharing this dataset's column layout
    pub fn append(&mut self, columns: &[String], rows: Vec<Vec<Cell>>) -> PrepResult<usize> {
        if columns != self.columns.as_slice() {
            return Err(PrepError::ColumnMismatch {
                expected: self.columns.clone(),
                actual: columns.to_vec(),
            });
        }

        let appended = rows.len();
        self.rows.reserve(appended);
        self.rows.extend(rows);
        debug!("Appended {} rows ({} total)", appended, self.rows.len());

        Ok(appended)
    }
}

/// Encode the dataset as CSV into any writer
pub fn write_dataset_to<W: io::Write>(dataset: &Dataset, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);

    out.write_record(dataset.columns())?;
    for row in dataset.rows() {
        out.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    out.flush()?;

    Ok(())
}

/// Lay the dataset out on a worksheet: header row, then one row per record.
/// Null cells are left blank.
pub fn write_worksheet(dataset: &Dataset, worksheet: &mut Worksheet) -> Result<(), XlsxError> {
    for (col, name) in dataset.columns().iter().enumerate() {
        worksheet.write_string(0, column_number(col)?, name)?;
    }

    for (idx, row) in dataset.rows().iter().enumerate() {
        let xl_row = row_number(idx + 1)?;
        for (col, cell) in row.iter().enumerate() {
            let col = column_number(col)?;
            match cell {
                Cell::Number(n) if n.is_finite() => {
                    worksheet.write_number(xl_row, col, *n)?;
                }
                // Excel has no infinity; keep the text form
                Cell::Number(n) => {
                    worksheet.write_string(xl_row, col, n.to_string())?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(xl_row, col, s)?;
                }
                Cell::Null => {}
            }
        }
    }

    Ok(())
}

fn row_number(idx: usize) -> Result<u32, XlsxError> {
    u32::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

fn column_number(idx: usize) -> Result<u16, XlsxError> {
    u16::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Export the dataset to a single file, replacing any existing one.
/// A `.csv` path gets CSV; anything else gets an xlsx workbook.
pub fn write_dataset(dataset: &Dataset, path: &Path) -> PrepResult<usize> {
    info!("Writing {} rows to {:?}", dataset.len(), path);

    let file_name = path.display().to_string();

    if source_format(path) == Some(SourceFormat::Csv) {
        let file = std::fs::File::create(path).map_err(|e| PrepError::io(path, e))?;
        write_dataset_to(dataset, io::BufWriter::new(file)).map_err(|source| {
            PrepError::Csv {
                file: file_name,
                source,
            }
        })?;
    } else {
        let xlsx_err = |source| PrepError::Xlsx {
            file: file_name.clone(),
            source,
        };

        let mut workbook = Workbook::new();
        write_worksheet(dataset, workbook.add_worksheet()).map_err(xlsx_err)?;
        workbook.save(path).map_err(xlsx_err)?;
    }

    info!("Export complete");

    Ok(dataset.len())
}
