//! Parse functions - decode datafiles into string-celled SourceTables

use crate::ingestion::error::{PrepError, PrepResult};
use crate::ingestion::types::{SourceFile, SourceFormat, SourceTable};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

/// Decode one datafile according to its format
pub fn read_source_table(source: &SourceFile) -> PrepResult<SourceTable> {
    match source.format {
        SourceFormat::Workbook => read_workbook(&source.path, &source.file_name),
        SourceFormat::Csv => read_csv(&source.path, &source.file_name),
    }
}

/// Read the first worksheet of a workbook; the first row is the header
fn read_workbook(path: &Path, name: &str) -> PrepResult<SourceTable> {
    info!("Reading workbook {:?}", path);

    let spreadsheet_err = |source| PrepError::Spreadsheet {
        file: name.to_string(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names.first().ok_or_else(|| PrepError::EmptyWorkbook {
        file: name.to_string(),
    })?;
    debug!("Reading sheet: {}", sheet_name);

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(spreadsheet_err)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());

    let header = take_header(name, rows.next())?;

    Ok(build_table(name, header, rows))
}

/// Read a CSV datafile; the first record is the header
fn read_csv(path: &Path, name: &str) -> PrepResult<SourceTable> {
    info!("Reading CSV {:?}", path);

    let csv_err = |source| PrepError::Csv {
        file: name.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let mut rows = records.into_iter();
    let header = take_header(name, rows.next())?;

    Ok(build_table(name, header, rows))
}

/// The header row must exist and name at least one column
fn take_header(name: &str, first: Option<Vec<String>>) -> PrepResult<Vec<String>> {
    match first {
        Some(header) if header.iter().any(|h| !h.trim().is_empty()) => Ok(header),
        _ => Err(PrepError::MissingHeader {
            file: name.to_string(),
        }),
    }
}

fn build_table(
    name: &str,
    header: Vec<String>,
    rows: impl Iterator<Item = Vec<String>>,
) -> SourceTable {
    let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
    let width = header.len();

    let rows: Vec<Vec<String>> = rows
        .map(|mut row| {
            // Ragged rows are padded so every named column has a cell
            if row.len() < width {
                row.resize(width, String::new());
            }
            row
        })
        .collect();

    debug!("{}: {} columns, {} rows", name, width, rows.len());

    SourceTable {
        name: name.to_string(),
        header,
        rows,
    }
}

/// Render a workbook cell as the string the normalizer expects
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // f64 Display drops a zero fraction, so URN 100001.0 reads as "100001"
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

/// Load the keep-columns list: first field of each record, in file order
pub fn load_keep_columns(path: &Path, has_header: bool) -> PrepResult<Vec<String>> {
    info!("Loading keep-columns list from {:?}", path);

    let file = path.display().to_string();
    let csv_err = |source| PrepError::Csv {
        file: file.clone(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut columns = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        if let Some(name) = record.get(0).map(str::trim) {
            if !name.is_empty() {
                columns.push(name.to_string());
            }
        }
    }

    info!("Loaded {} keep-columns", columns.len());

    Ok(columns)
}
