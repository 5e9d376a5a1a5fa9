use std::path::{Path, PathBuf};
use std::time::Duration;

use polars::prelude::*;
use tracing::{debug, info, instrument};

use super::{
    DataError, Result,
    metadata::{self, DatasetInfo},
    schema::{self, NameRow, VotingBureauRecord},
    source::DataSource,
};

/// How the remote dataset is fetched on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Total number of download attempts before the dataset is declared unavailable.
    pub max_attempts: u32,
    /// Delay before the second attempt; grows linearly with each retry.
    pub retry_backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

/// Read-only handle over the contours parquet file.
///
/// Every query starts from a clone of the same lazy scan, so the handle can be
/// shared between threads without locking.
#[derive(Clone)]
pub struct BureauDataset {
    source: DataSource,
    path: PathBuf,
    frame: LazyFrame,
    has_bureau_code: bool,
    info: DatasetInfo,
}

impl std::fmt::Debug for BureauDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BureauDataset")
            .field("source", &self.source)
            .field("path", &self.path)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl BureauDataset {
    /// Open the dataset, downloading it first when the source is remote.
    ///
    /// Any failure to fetch, scan or validate the file is reported as
    /// [`DataError::Unavailable`] (or [`DataError::MissingColumn`]).
    #[instrument(name = "Open contours dataset", skip(options), level = "info")]
    pub fn open(source: &DataSource, options: &FetchOptions) -> Result<Self> {
        Self::open_in(source, crate::get_data_dir(), options)
    }

    /// Like [`BureauDataset::open`], caching remote files under `data_dir`.
    pub fn open_in(source: &DataSource, data_dir: &Path, options: &FetchOptions) -> Result<Self> {
        let t_open = std::time::Instant::now();
        let file_name = source.file_name()?;
        let path = Self::resolve_path(source, &file_name, data_dir, options)
            .map_err(|e| unavailable_from(source, e))?;

        let frame = LazyFrame::scan_parquet(&path, ScanArgsParquet::default())
            .map_err(|e| DataError::unavailable(source, e))?;
        let file_schema = frame
            .clone()
            .collect_schema()
            .map_err(|e| DataError::unavailable(source, e))?;
        schema::validate_schema(&file_schema)?;
        let has_bureau_code = file_schema.get(schema::BUREAU_CODE).is_some();

        let record_count = count_rows(&frame).map_err(|e| DataError::unavailable(source, e))?;
        let info = DatasetInfo {
            last_updated: metadata::last_updated(&file_name, &path)
                .map_err(|e| unavailable_from(source, e))?,
            source: source.to_string(),
            record_count,
        };

        info!(
            record_count,
            last_updated = %info.last_updated,
            has_bureau_code,
            elapsed = ?t_open.elapsed(),
            "Dataset opened"
        );

        Ok(Self {
            source: source.clone(),
            path,
            frame,
            has_bureau_code,
            info,
        })
    }

    fn resolve_path(
        source: &DataSource,
        file_name: &str,
        data_dir: &Path,
        options: &FetchOptions,
    ) -> Result<PathBuf> {
        match source {
            DataSource::Local(path) => {
                if path.exists() {
                    Ok(path.clone())
                } else {
                    Err(DataError::unavailable(source, "file does not exist"))
                }
            }
            DataSource::Remote(url) => {
                let cached = data_dir.join(file_name);
                if cached.exists() {
                    info!(path = ?cached, "Using cached dataset");
                    return Ok(cached);
                }
                fetch_remote(url, &cached, options)?;
                Ok(cached)
            }
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Local file the scan reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    pub fn has_bureau_code(&self) -> bool {
        self.has_bureau_code
    }

    /// A fresh lazy scan over the whole file.
    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone()
    }

    /// Rows matching `filter`, parsed into records with their geometry.
    ///
    /// The predicate is applied on the scan, so only matching row groups and
    /// the selected columns are read.
    #[instrument(name = "Query records", level = "debug", skip(self))]
    pub fn query(&self, filter: Expr) -> Result<Vec<VotingBureauRecord>> {
        let df = self
            .lazy()
            .filter(filter)
            .select(schema::record_exprs(self.has_bureau_code))
            .collect()?;
        debug!(rows = df.height(), "Query collected");
        schema::records_from_df(&df)
    }

    /// Descriptive columns of every row, without geometry.
    #[instrument(name = "Collect name rows", level = "debug", skip(self))]
    pub fn name_rows(&self) -> Result<Vec<NameRow>> {
        let df = self.lazy().select(schema::name_exprs()).collect()?;
        schema::name_rows_from_df(&df)
    }
}

/// Any failure while fetching or opening the file means the dataset cannot
/// be served; keep errors that already say so.
fn unavailable_from(source: &DataSource, e: DataError) -> DataError {
    if e.is_unavailable() {
        e
    } else {
        DataError::unavailable(source, e)
    }
}

fn count_rows(frame: &LazyFrame) -> PolarsResult<usize> {
    let df = frame
        .clone()
        .select([len().cast(DataType::UInt64).alias("n")])
        .collect()?;
    let n = df.column("n")?.u64()?.get(0).unwrap_or(0);
    Ok(n as usize)
}

#[cfg(feature = "download_data")]
fn fetch_remote(url: &str, destination: &Path, options: &FetchOptions) -> Result<()> {
    super::fetch::download_dataset(url, destination, options)
}

#[cfg(not(feature = "download_data"))]
fn fetch_remote(_url: &str, _destination: &Path, _options: &FetchOptions) -> Result<()> {
    tracing::warn!("download_data feature is disabled, cannot fetch remote dataset");
    Err(DataError::DownloadDisabled)
}
