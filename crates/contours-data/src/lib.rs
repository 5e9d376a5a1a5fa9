//! Dataset accessor for the voting-bureau contours file.
//!
//! The dataset is a single GeoParquet file with one row per bureau de vote,
//! published on object storage. This crate resolves where the file comes
//! from ([`DataSource`]), downloads it once, scans it lazily with polars and
//! parses rows into [`VotingBureauRecord`] at the boundary.
use once_cell::sync::Lazy;
use std::path::PathBuf;
use tracing::warn;

pub mod dataset;
mod error;
#[cfg(feature = "download_data")]
pub mod fetch;
pub mod metadata;
pub mod schema;
pub mod source;
pub mod test_data;

static TEST_DATA_DIR: Lazy<tempfile::TempDir> = Lazy::new(|| {
    tempfile::TempDir::new().expect("Failed to create global temporary test data directory")
});

pub const DATA_DIR_DEFAULT: &str = "./contours_data";

/// Global data directory used to cache downloaded dataset files.
///
/// Tests always get a private temporary directory. Otherwise `DATA_DIR` wins,
/// then the platform cache directory (with the `system-dirs` feature), then
/// [`DATA_DIR_DEFAULT`].
pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    if cfg!(test) {
        let temp_dir = TEST_DATA_DIR.path().to_path_buf();
        warn!(temp_dir = ?temp_dir, "Using temporary data directory for tests");
        return temp_dir;
    }
    if let Ok(dir) = std::env::var("DATA_DIR") {
        return PathBuf::from(dir);
    }
    #[cfg(feature = "system-dirs")]
    {
        if let Some(dirs) =
            directories::ProjectDirs::from("fr", "contours", "contours-bureaux-vote")
        {
            return dirs.cache_dir().to_path_buf();
        }
    }
    PathBuf::from(DATA_DIR_DEFAULT)
});

pub fn get_data_dir() -> &'static PathBuf {
    &DATA_DIR
}

pub use dataset::{BureauDataset, FetchOptions};
pub use error::{DataError, Result};
pub use metadata::DatasetInfo;
pub use schema::{NameRow, VotingBureauRecord};
pub use source::{DEFAULT_PARQUET_URL, DataSource};
pub use test_data::{TestDataConfig, create_test_data};

#[cfg(test)]
pub(crate) mod tests_utils {
    use polars::prelude::*;

    pub fn assert_has_columns(df: &DataFrame, expected_columns: &[&str]) {
        let actual_columns: Vec<_> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        for expected_col in expected_columns {
            assert!(
                actual_columns.contains(expected_col),
                "Missing column: {expected_col}. Available columns: {actual_columns:?}"
            );
        }
    }

    pub fn assert_no_nulls_in_column(df: &DataFrame, column: &str) {
        let null_count = df
            .column(column)
            .unwrap_or_else(|_| panic!("Column '{column}' not found"))
            .null_count();
        assert_eq!(
            null_count, 0,
            "Column '{column}' contains {null_count} null values"
        );
    }
}
