use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use splitcast_core::config::{parse_group_columns, resolve_data_dir, FormatConfig, OrganizeConfig};
use splitcast_core::organize::run_organize;
use splitcast_core::reformat::format_results;
use splitcast_core::source::LocalDatasetSource;
use splitcast_core::writer::CsvPartitionWriter;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Forecasting pipeline data preparation steps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a dataset per group into train and forecast CSV files
    OrganizeData(OrganizeDataArgs),
    /// Convert the inference job's space delimited output into a CSV file
    FormatResults(FormatResultsArgs),
}

#[derive(Args, Debug)]
struct OrganizeDataArgs {
    /// Directory receiving the `<group>_train.csv` files
    #[arg(long)]
    train_dataset: PathBuf,
    /// Directory receiving the `<group>_forecast.csv` files
    #[arg(long)]
    forecast_dataset: PathBuf,
    /// Name of the source dataset under the data directory
    #[arg(long)]
    source_dataset_name: String,
    /// Grouping columns, separated by `;`
    #[arg(long)]
    group_column_names: String,
    /// Column compared against the cutoff
    #[arg(long)]
    timestamp_column: String,
    /// Rows strictly before this value are training history
    #[arg(long)]
    cutoff_date: String,
    /// Dataset root (defaults to SPLITCAST_DATA_DIR, then the working directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FormatResultsArgs {
    /// Directory receiving forecasting_results.csv
    #[arg(long)]
    result_dataset: PathBuf,
    /// Directory containing parallel_run_step.txt
    #[arg(long)]
    forecast_output_dir: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::OrganizeData(args) => handle_organize_data(args),
        Command::FormatResults(args) => handle_format_results(args),
    }
}

fn handle_organize_data(args: OrganizeDataArgs) -> Result<()> {
    let config = OrganizeConfig {
        train_dataset: args.train_dataset,
        forecast_dataset: args.forecast_dataset,
        source_dataset_name: args.source_dataset_name,
        group_column_names: parse_group_columns(&args.group_column_names),
        timestamp_column: args.timestamp_column,
        cutoff_date: args.cutoff_date,
        data_dir: resolve_data_dir(args.data_dir),
    };
    info!(data_dir = %config.data_dir.display(), "starting organize-data");

    let source = LocalDatasetSource::new(&config.data_dir);
    let writer = CsvPartitionWriter::new(&config.train_dataset, &config.forecast_dataset)
        .context("failed to create output directories")?;

    let summary = run_organize(&source, &writer, &config).with_context(|| {
        format!(
            "failed to organize dataset '{}'",
            config.source_dataset_name
        )
    })?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn handle_format_results(args: FormatResultsArgs) -> Result<()> {
    let config = FormatConfig {
        result_dataset: args.result_dataset,
        forecast_output_dir: args.forecast_output_dir,
    };

    let records = format_results(&config).context("failed to format inference results")?;

    println!(
        "{}",
        serde_json::json!({
            "result_dataset": config.result_dataset,
            "records": records,
        })
    );
    Ok(())
}
