// crates/splitcast-core/src/error.rs

use std::path::PathBuf;

use polars::prelude::{DataType, PolarsError};
use thiserror::Error;

/// Failures raised while splitting a dataset into per-group partitions.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("column '{column}' does not exist in the dataset schema")]
    Schema { column: String },

    #[error("timestamp column '{column}' ({dtype}) cannot be compared against cutoff {cutoff}")]
    Comparison {
        column: String,
        dtype: DataType,
        cutoff: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Split failed: {0}")]
    Split(#[from] SplitError),

    #[error("dataset '{name}' not found under {}", root.display())]
    DatasetNotFound { name: String, root: PathBuf },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
