//! Data ingestion module - functional pipeline for multi-year CSP datafiles

pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod write;

pub use config::PrepConfig;
pub use error::{PrepError, PrepResult};
pub use types::*;
pub use write::Dataset;
