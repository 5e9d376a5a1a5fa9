use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{DataError, Result};

/// Published contours file on Scaleway object storage.
pub const DEFAULT_PARQUET_URL: &str =
    "https://contours-bureaux-vote.s3.fr-par.scw.cloud/20251108_contours_bureaux_vote.parquet";

/// Where the contours dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A parquet file served over HTTP(S), downloaded once into the data directory.
    Remote(String),
    /// A parquet file already on disk.
    Local(PathBuf),
}

impl Default for DataSource {
    fn default() -> Self {
        Self::Remote(DEFAULT_PARQUET_URL.to_string())
    }
}

impl DataSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Final path segment of the source, used as the cache file name and to
    /// recover the publication date.
    pub fn file_name(&self) -> Result<String> {
        match self {
            Self::Remote(url) => {
                let trimmed = url.split(['?', '#']).next().unwrap_or(url);
                trimmed
                    .rsplit('/')
                    .next()
                    .filter(|name| !name.is_empty())
                    .map(ToString::to_string)
                    .ok_or_else(|| DataError::InvalidSource(url.clone()))
            }
            Self::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| DataError::InvalidSource(path.display().to_string())),
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Remote(_) => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for DataSource {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DataError::InvalidSource("empty data source".to_string()));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::Remote(s.to_string()))
        } else {
            Ok(Self::Local(PathBuf::from(s)))
        }
    }
}
