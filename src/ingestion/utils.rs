//! Utility functions for file-name handling

use crate::ingestion::types::SourceFormat;
use std::path::Path;

/// Workbook extensions calamine can open
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Detect the source format from a file extension (case-insensitive)
pub fn source_format(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::Workbook)
    } else if ext == "csv" {
        Some(SourceFormat::Csv)
    } else {
        None
    }
}

/// Dated exports are prefixed with the academic year, e.g. `1819_ks4final.xlsx`
pub fn is_dated_export(file_name: &str) -> bool {
    file_name
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
}

/// Year label: first four characters of the file name
pub fn year_label(file_name: &str) -> String {
    file_name.chars().take(4).collect()
}

/// Split a comma-separated list, trimming entries and dropping blanks
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format() {
        assert_eq!(
            source_format(Path::new("1819_ks4final.xlsx")),
            Some(SourceFormat::Workbook)
        );
        assert_eq!(
            source_format(Path::new("1819_KS4FINAL.XLSX")),
            Some(SourceFormat::Workbook)
        );
        assert_eq!(
            source_format(Path::new("1718_ks2.ods")),
            Some(SourceFormat::Workbook)
        );
        assert_eq!(
            source_format(Path::new("1920_ks5.csv")),
            Some(SourceFormat::Csv)
        );
        assert_eq!(source_format(Path::new("1819_notes.txt")), None);
        assert_eq!(source_format(Path::new("README")), None);
    }

    #[test]
    fn test_is_dated_export() {
        assert!(is_dated_export("1819_ks4final.xlsx"));
        assert!(!is_dated_export("dataset.csv"));
        assert!(!is_dated_export("~$1819_ks4final.xlsx"));
        assert!(!is_dated_export(""));
    }

    #[test]
    fn test_year_label() {
        assert_eq!(year_label("1819_ks4final.xlsx"), "1819");
        assert_eq!(year_label("2021.csv"), "2021");
        assert_eq!(year_label("12"), "12");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" 100001, 100002 ,,"),
            vec!["100001".to_string(), "100002".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
