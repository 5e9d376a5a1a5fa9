use polars::prelude::PolarsError;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[cfg(feature = "download_data")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "download_data")]
    #[error("Join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] geozero::error::GeozeroError),
    #[error("Dataset unavailable from {source_name}: {reason}")]
    Unavailable { source_name: String, reason: String },
    #[error("Required column '{0}' not found in dataset")]
    MissingColumn(&'static str),
    #[error("Invalid data source: {0}")]
    InvalidSource(String),
    #[error("Remote data source given but the download_data feature is disabled")]
    DownloadDisabled,
}

impl DataError {
    pub(crate) fn unavailable(source_name: impl ToString, reason: impl ToString) -> Self {
        Self::Unavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error means the dataset itself cannot be served, as opposed
    /// to a single query failing against an open dataset.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Unavailable { .. }
            | Self::MissingColumn(_)
            | Self::InvalidSource(_)
            | Self::DownloadDisabled => true,
            #[cfg(feature = "download_data")]
            Self::Http(_) => true,
            _ => false,
        }
    }
}
