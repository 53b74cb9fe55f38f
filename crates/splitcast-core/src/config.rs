use std::env;
use std::path::PathBuf;

use crate::dataset::Cutoff;
use crate::splitter::GroupedTimeSplitter;

pub const DATA_DIR_ENV: &str = "SPLITCAST_DATA_DIR";

/// Settings for the organize-data step.
#[derive(Debug, Clone)]
pub struct OrganizeConfig {
    pub train_dataset: PathBuf,
    pub forecast_dataset: PathBuf,
    pub source_dataset_name: String,
    pub group_column_names: Vec<String>,
    pub timestamp_column: String,
    pub cutoff_date: String,
    pub data_dir: PathBuf,
}

impl OrganizeConfig {
    pub fn splitter(&self) -> GroupedTimeSplitter {
        GroupedTimeSplitter::new(
            self.group_column_names.iter().cloned(),
            self.timestamp_column.clone(),
            Cutoff::Text(self.cutoff_date.clone()),
        )
    }
}

/// Settings for the format-results step.
#[derive(Debug, Clone)]
pub struct FormatConfig {
    pub result_dataset: PathBuf,
    pub forecast_output_dir: PathBuf,
}

/// Splits a `;` separated column list, trimming names and dropping empty segments.
pub fn parse_group_columns(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Explicit directory first, then `SPLITCAST_DATA_DIR`, then the working directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_columns_split_on_semicolons() {
        assert_eq!(parse_group_columns("store;brand"), vec!["store", "brand"]);
        assert_eq!(parse_group_columns(" store ; ;brand;"), vec!["store", "brand"]);
        assert!(parse_group_columns(";;").is_empty());
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/data/sales")));
        assert_eq!(dir, PathBuf::from("/data/sales"));
    }
}
