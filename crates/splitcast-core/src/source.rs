use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};

const SUPPORTED_EXTENSIONS: [&str; 2] = ["parquet", "csv"];

/// Provider of source datasets by name.
pub trait DatasetSource {
    fn load(&self, name: &str) -> Result<DataFrame>;
}

/// Reads datasets from `<root>/<name>.parquet` or `<root>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct LocalDatasetSource {
    root: PathBuf,
}

impl LocalDatasetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let candidates = SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .chain(std::iter::once(self.root.join(name)));

        candidates
            .filter(|path| path.is_file())
            .find(|path| extension_of(path).is_some())
    }
}

impl DatasetSource for LocalDatasetSource {
    fn load(&self, name: &str) -> Result<DataFrame> {
        let path = self
            .resolve(name)
            .ok_or_else(|| PipelineError::DatasetNotFound {
                name: name.to_string(),
                root: self.root.clone(),
            })?;

        let df = match extension_of(&path) {
            Some("parquet") => ParquetReader::new(File::open(&path)?).finish()?,
            _ => read_csv(&path)?,
        };

        info!(
            dataset = name,
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded source dataset"
        );
        Ok(df)
    }
}

fn extension_of(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    SUPPORTED_EXTENSIONS
        .iter()
        .copied()
        .find(|supported| supported.eq_ignore_ascii_case(ext))
}

fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}
