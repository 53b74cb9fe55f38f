use std::fs;

use anyhow::Result;
use tempfile::tempdir;

use splitcast_core::config::FormatConfig;
use splitcast_core::reformat::{format_results, reformat_results, RESULTS_FILE};
use splitcast_core::PipelineError;

#[test]
fn space_delimited_results_become_csv() -> Result<()> {
    let dir = tempdir()?;
    let forecast_output_dir = dir.path().join("inference");
    fs::create_dir_all(&forecast_output_dir)?;
    fs::write(
        forecast_output_dir.join("parallel_run_step.txt"),
        "store date prediction\nA 2021-06-15 12.5\nB 2021-06-01 7\n",
    )?;

    let config = FormatConfig {
        result_dataset: dir.path().join("results"),
        forecast_output_dir,
    };
    let records = format_results(&config)?;
    assert_eq!(records, 2);

    let written = fs::read_to_string(config.result_dataset.join(RESULTS_FILE))?;
    assert_eq!(
        written,
        "store,date,prediction\nA,2021-06-15,12.5\nB,2021-06-01,7\n"
    );
    Ok(())
}

#[test]
fn ragged_rows_are_rejected() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.txt");
    fs::write(&input, "a b\n1 2 3\n")?;

    let err = reformat_results(&input, &dir.path().join("out.csv")).expect_err("ragged row");
    assert!(matches!(err, PipelineError::Csv(_)));
    Ok(())
}

#[test]
fn missing_inference_output_is_an_error() -> Result<()> {
    let dir = tempdir()?;
    let config = FormatConfig {
        result_dataset: dir.path().join("results"),
        forecast_output_dir: dir.path().join("nowhere"),
    };
    assert!(format_results(&config).is_err());
    Ok(())
}
