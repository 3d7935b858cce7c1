//! Fetch functions - find the dated datafiles in the input directory

use crate::ingestion::error::{PrepError, PrepResult};
use crate::ingestion::types::SourceFile;
use crate::ingestion::utils::{is_dated_export, source_format, year_label};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// List datafiles whose name starts with a digit and carries a known extension.
/// Results are sorted by file name so runs are repeatable.
pub fn discover_sources(input_dir: &Path) -> PrepResult<Vec<SourceFile>> {
    info!("Scanning {:?} for datafiles", input_dir);

    let entries = fs::read_dir(input_dir).map_err(|e| PrepError::io(input_dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PrepError::io(input_dir, e))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        if !is_dated_export(&file_name) {
            debug!("Skipping {} (no year prefix)", file_name);
            continue;
        }

        let format = match source_format(&path) {
            Some(format) => format,
            None => {
                debug!("Skipping {} (unrecognized extension)", file_name);
                continue;
            }
        };

        sources.push(SourceFile {
            year: year_label(&file_name),
            path,
            file_name,
            format,
        });
    }

    sources.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    info!("Found {} datafiles", sources.len());

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::types::SourceFormat;
    use tempfile::tempdir;

    #[test]
    fn test_discover_sources() {
        let dir = tempdir().unwrap();
        for name in [
            "1920_ks4final.xlsx",
            "1819_ks4final.csv",
            "dataset.csv",
            "keep_columns.csv",
            "1819_notes.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("2021_archive.xlsx")).unwrap();

        let sources = discover_sources(dir.path()).unwrap();

        let names: Vec<&str> = sources.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec!["1819_ks4final.csv", "1920_ks4final.xlsx"]);
        assert_eq!(sources[0].year, "1819");
        assert_eq!(sources[0].format, SourceFormat::Csv);
        assert_eq!(sources[1].year, "1920");
        assert_eq!(sources[1].format, SourceFormat::Workbook);
    }

    #[test]
    fn test_discover_sources_missing_dir() {
        let dir = tempdir().unwrap();
        let result = discover_sources(&dir.path().join("missing"));

        assert!(matches!(result, Err(PrepError::Io { .. })));
    }
}
