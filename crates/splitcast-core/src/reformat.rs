use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::config::FormatConfig;
use crate::error::Result;

pub const INFERENCE_OUTPUT_FILE: &str = "parallel_run_step.txt";
pub const RESULTS_FILE: &str = "forecasting_results.csv";

/// Rewrites a space delimited file (header row included) as comma delimited.
/// Returns the number of data records written.
pub fn reformat_results(input: &Path, output: &Path) -> Result<usize> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(true)
        .from_path(input)?;
    let mut writer = WriterBuilder::new().delimiter(b',').from_path(output)?;

    writer.write_record(reader.headers()?)?;

    let mut records = 0usize;
    for record in reader.records() {
        writer.write_record(&record?)?;
        records += 1;
    }
    writer.flush()?;

    Ok(records)
}

/// Converts `<forecast_output_dir>/parallel_run_step.txt` into
/// `<result_dataset>/forecasting_results.csv`.
pub fn format_results(config: &FormatConfig) -> Result<usize> {
    let input = config.forecast_output_dir.join(INFERENCE_OUTPUT_FILE);
    fs::create_dir_all(&config.result_dataset)?;
    let output = config.result_dataset.join(RESULTS_FILE);

    let records = reformat_results(&input, &output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        records,
        "reformatted inference results"
    );
    Ok(records)
}
