//! Run orchestration - scan, decode, normalize, accumulate, export

use crate::ingestion::config::PrepConfig;
use crate::ingestion::fetch::discover_sources;
use crate::ingestion::normalize::{normalize_table, output_columns};
use crate::ingestion::parse::read_source_table;
use crate::ingestion::types::RunStats;
use crate::ingestion::write::{write_dataset, Dataset};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Build the merged dataset from every datafile in `config.input_dir`.
/// Files are handled one at a time; any error aborts before export.
pub fn build_dataset(config: &PrepConfig) -> Result<(Dataset, RunStats)> {
    let sources = discover_sources(&config.input_dir)?;
    if sources.is_empty() {
        warn!("No datafiles found in {:?}", config.input_dir);
    }

    let mut dataset = Dataset::new(output_columns(&config.keep_columns));
    let mut stats = RunStats::default();
    let mut matched_urns = BTreeSet::new();

    for (idx, source) in sources.iter().enumerate() {
        info!(
            "File {}/{}: {} (year {})",
            idx + 1,
            sources.len(),
            source.file_name,
            source.year
        );

        let table = read_source_table(source)
            .with_context(|| format!("Failed to read {}", source.file_name))?;

        let batch = normalize_table(&table, &source.year, config)
            .with_context(|| format!("Failed to normalize {}", source.file_name))?;

        dataset.append(&batch.columns, batch.rows)?;
        matched_urns.extend(batch.matched_urns);
        stats.files.push(batch.stats);
    }

    stats.unmatched_urns = config
        .keep_urns
        .difference(&matched_urns)
        .cloned()
        .collect();
    if !stats.unmatched_urns.is_empty() {
        warn!(
            "URNs not found in any datafile: {}",
            stats
                .unmatched_urns
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    stats.rows_written = dataset.len();

    Ok((dataset, stats))
}

/// Build the dataset and export it to `config.output_path`
pub fn run(config: &PrepConfig) -> Result<RunStats> {
    let (dataset, stats) = build_dataset(config)?;

    write_dataset(&dataset, &config.output_path)
        .with_context(|| format!("Failed to write {:?}", config.output_path))?;

    Ok(stats)
}
