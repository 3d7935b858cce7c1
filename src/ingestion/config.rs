//! Run configuration: the three filter lists plus input and output locations

use crate::ingestion::error::{PrepError, PrepResult};
use crate::ingestion::parse::load_keep_columns;
use crate::ingestion::utils::split_list;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::warn;

/// Default export file name, placed in the input directory
pub const DEFAULT_OUTPUT_FILE: &str = "dataset.xlsx";

/// Explicit configuration passed into the pipeline entry point
#[derive(Debug, Clone, Default)]
pub struct PrepConfig {
    pub keep_urns: BTreeSet<String>,
    pub keep_national: BTreeSet<String>,
    /// Ordered and duplicate-free; may name YEAR to place it explicitly
    pub keep_columns: Vec<String>,
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
}

impl PrepConfig {
    pub fn new(
        keep_urns: impl IntoIterator<Item = String>,
        keep_national: impl IntoIterator<Item = String>,
        keep_columns: impl IntoIterator<Item = String>,
        input_dir: impl Into<PathBuf>,
    ) -> Self {
        let input_dir = input_dir.into();
        let output_path = input_dir.join(DEFAULT_OUTPUT_FILE);

        PrepConfig {
            keep_urns: keep_urns.into_iter().collect(),
            keep_national: keep_national.into_iter().collect(),
            keep_columns: dedup_columns(keep_columns),
            input_dir,
            output_path,
        }
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> PrepResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> PrepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input_dir: PathBuf = lookup("INPUT_DIR")
            .unwrap_or_else(|| ".".to_string())
            .into();

        let keep_urns = lookup("KEEP_URNS")
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let keep_national = lookup("KEEP_NATIONAL")
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let keep_columns_file = lookup("KEEP_COLUMNS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| input_dir.join("keep_columns.csv"));

        let has_header = match lookup("KEEP_COLUMNS_HEADER") {
            Some(raw) => parse_bool("KEEP_COLUMNS_HEADER", &raw)?,
            None => true,
        };

        let output_path = lookup("OUTPUT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| input_dir.join(DEFAULT_OUTPUT_FILE));

        let keep_columns = load_keep_columns(&keep_columns_file, has_header)?;

        if keep_urns.is_empty() && keep_national.is_empty() {
            warn!("KEEP_URNS and KEEP_NATIONAL are both empty; no rows will be kept");
        }

        Ok(PrepConfig::new(keep_urns, keep_national, keep_columns, input_dir)
            .with_output_path(output_path))
    }
}

fn parse_bool(key: &str, raw: &str) -> PrepResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(PrepError::InvalidConfig {
            message: format!("{} must be true or false, got {:?}", key, other),
        }),
    }
}

fn dedup_columns(columns: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for column in columns {
        if seen.insert(column.clone()) {
            kept.push(column);
        }
    }

    kept
}
