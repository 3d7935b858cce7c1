//! Normalization functions - project, filter, annotate and coerce SourceTables
//!
//! Every retained row goes through the same shape:
//! keep-columns in list order, with `YEAR` wherever the list names it or
//! last otherwise. Cells other than `YEAR` have
//! percentages turned into fractions and are then coerced to numbers, with
//! anything non-numeric becoming `Cell::Null`.

use crate::ingestion::config::PrepConfig;
use crate::ingestion::error::{PrepError, PrepResult};
use crate::ingestion::types::{
    Cell, FileStats, SourceTable, RECTYPE_COLUMN, URN_COLUMN, YEAR_COLUMN,
};
use std::collections::BTreeSet;
use std::num::ParseFloatError;
use tracing::{debug, info};

/// A cell after the percentage stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Staged<'a> {
    /// `%` was present and stripped; value already divided by 100
    Fraction(f64),
    /// No `%`, passed through untouched
    Raw(&'a str),
}

/// Normalized rows from one SourceTable, ready to append
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub matched_urns: BTreeSet<String>,
    pub stats: FileStats,
}

/// Convert `"45.6%"` to `0.456`; strings without `%` pass through
pub fn pct_to_float(cell: &str) -> Result<Staged<'_>, ParseFloatError> {
    if !cell.contains('%') {
        return Ok(Staged::Raw(cell));
    }

    let value: f64 = cell.replace('%', "").trim().parse()?;
    Ok(Staged::Fraction(value / 100.0))
}

/// Coerce a string to a number; anything unparseable becomes Null
pub fn to_numeric(cell: &str) -> Cell {
    match cell.trim().parse::<f64>() {
        Ok(n) => number_cell(n),
        Err(_) => Cell::Null,
    }
}

fn number_cell(n: f64) -> Cell {
    // NaN is the spreadsheet null, not a value
    if n.is_nan() {
        Cell::Null
    } else {
        Cell::Number(n)
    }
}

/// Percentage stage followed by numeric coercion
pub fn normalize_cell(cell: &str) -> Result<Cell, ParseFloatError> {
    Ok(match pct_to_float(cell)? {
        Staged::Fraction(f) => number_cell(f),
        Staged::Raw(s) => to_numeric(s),
    })
}

/// Output column layout: keep-columns in order, YEAR appended unless listed
pub fn output_columns(keep_columns: &[String]) -> Vec<String> {
    let mut columns = keep_columns.to_vec();
    if !columns.iter().any(|c| c == YEAR_COLUMN) {
        columns.push(YEAR_COLUMN.to_string());
    }
    columns
}

/// Filter and normalize one SourceTable
pub fn normalize_table(
    table: &SourceTable,
    year: &str,
    config: &PrepConfig,
) -> PrepResult<NormalizedBatch> {
    let column_index = |column: &str| {
        table
            .column_index(column)
            .ok_or_else(|| PrepError::MissingColumn {
                file: table.name.clone(),
                column: column.to_string(),
            })
    };

    let columns = output_columns(&config.keep_columns);

    // None marks the YEAR slot, filled from the file name rather than the source
    let projection = columns
        .iter()
        .map(|c| match c.as_str() {
            YEAR_COLUMN => Ok(None),
            other => column_index(other).map(Some),
        })
        .collect::<PrepResult<Vec<Option<usize>>>>()?;
    let urn_idx = column_index(URN_COLUMN)?;
    let rectype_idx = column_index(RECTYPE_COLUMN)?;

    let mut rows = Vec::new();
    let mut matched_urns = BTreeSet::new();
    let mut null_cells = 0;

    for (row_number, row) in table.rows.iter().enumerate() {
        let value_at = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        // Membership ignores surrounding whitespace in the source cell
        let urn = value_at(urn_idx).trim();
        let rectype = value_at(rectype_idx).trim();

        let urn_match = config.keep_urns.contains(urn);
        if !(urn_match || config.keep_national.contains(rectype)) {
            continue;
        }
        if urn_match {
            matched_urns.insert(urn.to_string());
        }

        let mut cells = Vec::with_capacity(projection.len());
        for (slot, column) in projection.iter().zip(&columns) {
            let idx = match slot {
                Some(idx) => *idx,
                None => {
                    // YEAR is provenance and is never coerced
                    cells.push(Cell::Text(year.to_string()));
                    continue;
                }
            };
            let raw = value_at(idx);
            let cell = normalize_cell(raw).map_err(|_| PrepError::MalformedPercentage {
                file: table.name.clone(),
                row: row_number + 1,
                column: column.clone(),
                value: raw.to_string(),
            })?;
            if cell.is_null() {
                null_cells += 1;
            }
            cells.push(cell);
        }

        rows.push(cells);
    }

    debug!(
        "{}: kept {} of {} rows",
        table.name,
        rows.len(),
        table.rows.len()
    );

    let stats = FileStats {
        file: table.name.clone(),
        year: year.to_string(),
        rows_read: table.rows.len(),
        rows_kept: rows.len(),
        null_cells,
    };
    info!("Normalized {}", stats);

    Ok(NormalizedBatch {
        columns,
        rows,
        matched_urns,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn mock_table() -> SourceTable {
        SourceTable {
            name: "1819_ks4final.xlsx".to_string(),
            header: strings(&["URN", "SCHNAME", "RECTYPE", "PTL2BASICS_95", "TOTPUPS"]),
            rows: vec![
                strings(&["100001", "Alpha School", "1", "62.3%", "120"]),
                strings(&["999999", "Other School", "1", "10%", "80"]),
                strings(&["", "England", "4", "43.2%", "SUPP"]),
                strings(&["100002", "Beta School", "1", "NE", ""]),
            ],
        }
    }

    fn mock_config() -> PrepConfig {
        PrepConfig::new(
            strings(&["100001", "100002"]),
            strings(&["4"]),
            strings(&["URN", "RECTYPE", "PTL2BASICS_95", "TOTPUPS"]),
            "/data",
        )
    }

    fn approx(cell: &Cell, expected: f64) -> bool {
        cell.as_number()
            .map(|n| (n - expected).abs() < 1e-12)
            .unwrap_or(false)
    }

    #[test]
    fn test_pct_to_float() {
        match pct_to_float("45.6%").unwrap() {
            Staged::Fraction(f) => assert!((f - 0.456).abs() < 1e-12),
            other => panic!("Expected Fraction, got {:?}", other),
        }
        assert_eq!(pct_to_float("100%").unwrap(), Staged::Fraction(1.0));
        assert_eq!(pct_to_float(" 50 %").unwrap(), Staged::Fraction(0.5));
        assert_eq!(pct_to_float("7").unwrap(), Staged::Raw("7"));
        assert_eq!(pct_to_float("NE").unwrap(), Staged::Raw("NE"));
    }

    #[test]
    fn test_pct_to_float_malformed() {
        assert!(pct_to_float("%").is_err());
        assert!(pct_to_float("abc%").is_err());
        assert!(pct_to_float("").is_ok());
    }

    #[test]
    fn test_to_numeric() {
        assert_eq!(to_numeric("42"), Cell::Number(42.0));
        assert_eq!(to_numeric("-3.5"), Cell::Number(-3.5));
        assert_eq!(to_numeric(" 7 "), Cell::Number(7.0));
        assert_eq!(to_numeric("NE"), Cell::Null);
        assert_eq!(to_numeric(""), Cell::Null);
        assert_eq!(to_numeric("nan"), Cell::Null);
    }

    #[test]
    fn test_normalize_cell() {
        assert!(approx(&normalize_cell("62.3%").unwrap(), 0.623));
        assert_eq!(normalize_cell("SUPP").unwrap(), Cell::Null);
        assert_eq!(normalize_cell("120").unwrap(), Cell::Number(120.0));
        assert!(normalize_cell("x%").is_err());
    }

    #[test]
    fn test_normalize_table_filters_and_projects() {
        let batch = normalize_table(&mock_table(), "1819", &mock_config()).unwrap();

        assert_eq!(
            batch.columns,
            strings(&["URN", "RECTYPE", "PTL2BASICS_95", "TOTPUPS", "YEAR"])
        );
        assert_eq!(batch.rows.len(), 3);

        // School row
        let first = &batch.rows[0];
        assert_eq!(first[0], Cell::Number(100001.0));
        assert_eq!(first[1], Cell::Number(1.0));
        assert!(approx(&first[2], 0.623));
        assert_eq!(first[3], Cell::Number(120.0));
        assert_eq!(first[4], Cell::Text("1819".to_string()));

        // National row: blank URN and suppressed count become null
        let national = &batch.rows[1];
        assert_eq!(national[0], Cell::Null);
        assert!(approx(&national[2], 0.432));
        assert_eq!(national[3], Cell::Null);

        // Non-numeric codes become null
        let last = &batch.rows[2];
        assert_eq!(last[2], Cell::Null);
        assert_eq!(last[3], Cell::Null);

        assert_eq!(batch.stats.rows_read, 4);
        assert_eq!(batch.stats.rows_kept, 3);
        assert_eq!(batch.stats.null_cells, 4);
        assert_eq!(
            batch.matched_urns.into_iter().collect::<Vec<_>>(),
            strings(&["100001", "100002"])
        );
    }

    #[test]
    fn test_every_row_has_year_and_keep_columns() {
        let config = mock_config();
        let batch = normalize_table(&mock_table(), "1819", &config).unwrap();

        for row in &batch.rows {
            assert_eq!(row.len(), config.keep_columns.len() + 1);
            assert_eq!(row.last().and_then(Cell::as_text), Some("1819"));
        }
    }

    #[test]
    fn test_filter_uses_source_columns() {
        // URN and RECTYPE are not retained but still drive the filter
        let config = PrepConfig::new(
            strings(&["100001"]),
            Vec::new(),
            strings(&["TOTPUPS"]),
            "/data",
        );
        let batch = normalize_table(&mock_table(), "1819", &config).unwrap();

        assert_eq!(batch.columns, strings(&["TOTPUPS", "YEAR"]));
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0][0], Cell::Number(120.0));
    }

    #[test]
    fn test_year_keeps_listed_position() {
        let config = PrepConfig::new(
            strings(&["100001"]),
            Vec::new(),
            strings(&["URN", "YEAR", "TOTPUPS"]),
            "/data",
        );
        let batch = normalize_table(&mock_table(), "1819", &config).unwrap();

        assert_eq!(batch.columns, strings(&["URN", "YEAR", "TOTPUPS"]));
        assert_eq!(
            batch.rows[0],
            vec![
                Cell::Number(100001.0),
                Cell::Text("1819".to_string()),
                Cell::Number(120.0),
            ]
        );
    }

    #[test]
    fn test_source_year_column_is_replaced() {
        let mut table = mock_table();
        table.header[1] = "YEAR".to_string();
        let config = PrepConfig::new(strings(&["100001"]), Vec::new(), Vec::new(), "/data");

        let batch = normalize_table(&table, "1819", &config).unwrap();

        assert_eq!(batch.columns, strings(&["YEAR"]));
        assert_eq!(batch.rows[0], vec![Cell::Text("1819".to_string())]);
    }

    #[test]
    fn test_filter_ignores_padding() {
        let mut table = mock_table();
        table.rows[0][0] = " 100001 ".to_string();
        table.rows[2][2] = "4 ".to_string();

        let batch = normalize_table(&table, "1819", &mock_config()).unwrap();

        assert_eq!(batch.rows.len(), 3);
        assert_eq!(batch.rows[0][0], Cell::Number(100001.0));
        assert!(batch.matched_urns.contains("100001"));
    }

    #[test]
    fn test_missing_keep_column() {
        let config = PrepConfig::new(
            strings(&["100001"]),
            Vec::new(),
            strings(&["URN", "ATT8SCR"]),
            "/data",
        );

        match normalize_table(&mock_table(), "1819", &config) {
            Err(PrepError::MissingColumn { column, .. }) => assert_eq!(column, "ATT8SCR"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_filter_column() {
        let mut table = mock_table();
        table.header[2] = "RECORDTYPE".to_string();
        let config = PrepConfig::new(strings(&["100001"]), Vec::new(), Vec::new(), "/data");

        match normalize_table(&table, "1819", &config) {
            Err(PrepError::MissingColumn { column, .. }) => assert_eq!(column, "RECTYPE"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_percentage_is_fatal() {
        let mut table = mock_table();
        table.rows[0][3] = "n/a%".to_string();

        match normalize_table(&table, "1819", &mock_config()) {
            Err(PrepError::MalformedPercentage {
                row, column, value, ..
            }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "PTL2BASICS_95");
                assert_eq!(value, "n/a%");
            }
            other => panic!("Expected MalformedPercentage, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_percentage_in_dropped_row_is_ignored() {
        let mut table = mock_table();
        table.rows[1][3] = "%".to_string();

        assert!(normalize_table(&table, "1819", &mock_config()).is_ok());
    }

    #[test]
    fn test_empty_filters_keep_nothing() {
        let config = PrepConfig::new(
            Vec::new(),
            Vec::new(),
            strings(&["URN"]),
            "/data",
        );
        let batch = normalize_table(&mock_table(), "1819", &config).unwrap();

        assert!(batch.rows.is_empty());
        assert_eq!(batch.columns, strings(&["URN", "YEAR"]));
    }
}
