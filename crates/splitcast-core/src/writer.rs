use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use crate::dataset::{GroupKey, Partition};
use crate::error::Result;

pub const TRAIN_SUFFIX: &str = "_train.csv";
pub const FORECAST_SUFFIX: &str = "_forecast.csv";

/// Persists one group's partition.
pub trait PartitionWriter {
    fn write(&self, key: &GroupKey, partition: &mut Partition) -> Result<WrittenPartition>;
}

/// Locations and row counts of a persisted partition.
#[derive(Debug, Clone)]
pub struct WrittenPartition {
    pub train_path: PathBuf,
    pub forecast_path: PathBuf,
    pub history_rows: usize,
    pub forecast_rows: usize,
}

/// Writes `<train_dir>/<key>_train.csv` and `<forecast_dir>/<key>_forecast.csv`,
/// where `<key>` is the group values joined by `_`.
#[derive(Debug, Clone)]
pub struct CsvPartitionWriter {
    train_dir: PathBuf,
    forecast_dir: PathBuf,
}

impl CsvPartitionWriter {
    pub fn new(train_dir: impl Into<PathBuf>, forecast_dir: impl Into<PathBuf>) -> Result<Self> {
        let writer = Self {
            train_dir: train_dir.into(),
            forecast_dir: forecast_dir.into(),
        };
        fs::create_dir_all(&writer.train_dir)?;
        fs::create_dir_all(&writer.forecast_dir)?;
        Ok(writer)
    }

    pub fn file_stem(key: &GroupKey) -> String {
        key.join("_")
    }
}

impl PartitionWriter for CsvPartitionWriter {
    fn write(&self, key: &GroupKey, partition: &mut Partition) -> Result<WrittenPartition> {
        let stem = Self::file_stem(key);
        let train_path = self.train_dir.join(format!("{stem}{TRAIN_SUFFIX}"));
        let forecast_path = self.forecast_dir.join(format!("{stem}{FORECAST_SUFFIX}"));

        write_csv(&train_path, &mut partition.history)?;
        write_csv(&forecast_path, &mut partition.forecast)?;

        debug!(
            key = %key,
            train = %train_path.display(),
            forecast = %forecast_path.display(),
            "wrote group partition"
        );

        Ok(WrittenPartition {
            train_path,
            forecast_path,
            history_rows: partition.history_rows(),
            forecast_rows: partition.forecast_rows(),
        })
    }
}

fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
