// Library module for testable functions

pub mod ingestion;

pub use ingestion::normalize::{pct_to_float, to_numeric};
pub use ingestion::pipeline::{build_dataset, run};
