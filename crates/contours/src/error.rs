use contours_data::DataError;
use thiserror::Error;
use tracing::error;

use crate::export::ExportError;
use crate::search::{EntityType, SearchError};

#[derive(Error, Debug)]
pub enum ContoursError {
    #[error("Dataset unavailable: {0}")]
    DataUnavailable(#[source] DataError),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("No {entity_type} found for key '{key}'")]
    NotFound { entity_type: EntityType, key: String },
    #[error("Query engine failure: {0}")]
    QueryEngineFailure(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),
}

/// Coarse classification of a [`ContoursError`], for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DataUnavailable,
    InvalidQuery,
    NotFound,
    QueryEngineFailure,
    ConfigError,
    InitLoggingError,
}

impl ErrorKind {
    /// HTTP status a service front end would answer with.
    pub fn status_code(self) -> u16 {
        match self {
            Self::DataUnavailable => 503,
            Self::InvalidQuery => 400,
            Self::NotFound => 404,
            Self::QueryEngineFailure | Self::ConfigError | Self::InitLoggingError => 500,
        }
    }
}

impl ContoursError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataUnavailable(_) => ErrorKind::DataUnavailable,
            Self::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::QueryEngineFailure(_) => ErrorKind::QueryEngineFailure,
            Self::ConfigError(_) => ErrorKind::ConfigError,
            Self::InitLoggingError(_) => ErrorKind::InitLoggingError,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    fn query_engine(cause: impl std::fmt::Display) -> Self {
        let message = cause.to_string();
        error!(error = %message, "Query engine failure");
        Self::QueryEngineFailure(message)
    }
}

impl From<DataError> for ContoursError {
    fn from(e: DataError) -> Self {
        if e.is_unavailable() {
            Self::DataUnavailable(e)
        } else {
            Self::query_engine(e)
        }
    }
}

impl From<polars::prelude::PolarsError> for ContoursError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        Self::query_engine(e)
    }
}

impl From<serde_json::Error> for ContoursError {
    fn from(e: serde_json::Error) -> Self {
        Self::query_engine(e)
    }
}

impl From<SearchError> for ContoursError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Data(e) => e.into(),
            SearchError::EmptyQuery
            | SearchError::QueryTooLong { .. }
            | SearchError::InvalidKey { .. }
            | SearchError::UnknownEntityType(_) => Self::InvalidQuery(e.to_string()),
        }
    }
}

impl From<ExportError> for ContoursError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::NotFound { entity_type, key } => Self::NotFound { entity_type, key },
            ExportError::Data(e) => e.into(),
            ExportError::NoGeometry { .. } | ExportError::UndecodableGeometry { .. } => {
                Self::query_engine(e)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ContoursError>;
