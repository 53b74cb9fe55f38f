use serde::Serialize;
use tracing::{info, warn};

use crate::config::OrganizeConfig;
use crate::error::Result;
use crate::source::DatasetSource;
use crate::writer::PartitionWriter;

/// Row accounting for one organize-data run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SplitSummary {
    pub dataset: String,
    pub groups: usize,
    pub history_rows: usize,
    pub forecast_rows: usize,
}

/// Loads the source dataset, splits it per group and writes every partition.
pub fn run_organize(
    source: &dyn DatasetSource,
    writer: &dyn PartitionWriter,
    config: &OrganizeConfig,
) -> Result<SplitSummary> {
    let df = source.load(&config.source_dataset_name)?;
    let splitter = config.splitter();
    let split = splitter.split(&df)?;
    info!(
        dataset = %config.source_dataset_name,
        groups = split.group_count(),
        "split source dataset"
    );

    let mut summary = SplitSummary {
        dataset: config.source_dataset_name.clone(),
        ..SplitSummary::default()
    };

    for item in split {
        let (key, mut partition) = item?;
        if partition.history_rows() == 0 {
            warn!(key = %key, "group has no rows before the cutoff");
        }
        let written = writer.write(&key, &mut partition)?;
        summary.groups += 1;
        summary.history_rows += written.history_rows;
        summary.forecast_rows += written.forecast_rows;
    }

    info!(
        dataset = %summary.dataset,
        groups = summary.groups,
        history_rows = summary.history_rows,
        forecast_rows = summary.forecast_rows,
        "organized dataset into group partitions"
    );
    Ok(summary)
}
