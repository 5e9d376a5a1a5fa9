//! Contours - Voting bureau contours lookup library
//!
//! Finds French departments, electoral constituencies and municipalities by
//! name, and exports the contours of their bureaux de vote as GeoJSON. The
//! contours come from a published GeoParquet file with one row per bureau.
//!
//! # Quick Start
//!
//! ```rust
//! use contours::{ContoursService, EntityType, TypeFilter};
//! use contours::data::{DataSource, TestDataConfig, create_test_data};
//!
//! // A small synthetic dataset; `DataSource::default()` is the published file
//! let file = create_test_data(&TestDataConfig::sample())?;
//! let service = ContoursService::open(DataSource::Local(file.path().to_path_buf()))?;
//!
//! // Accents and case do not matter
//! let results = service.search("CORREZE", TypeFilter::Only(EntityType::Department))?;
//! assert_eq!(results[0].label(), "19 - Corrèze");
//!
//! // Dissolved geometry of the whole department
//! let export = service.export(&results[0].key)?;
//! println!("{} -> {}", export.file_name(), export.to_geojson_string()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - **Accent-insensitive search**: `"fleville"` finds `"Fléville"`
//! - **Dissolved exports**: the bureaux of an entity are merged into one `MultiPolygon`
//! - **Cached download**: the remote file is fetched once, with bounded retries
//! - **Thread safe**: one read-only dataset handle serves concurrent queries
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
pub mod error;
pub mod export;
pub mod normalize;
pub mod search;

pub use crate::core::{ContoursService, SearchResults};

pub use config::{
    ENV_FETCH_ATTEMPTS, ENV_PARQUET_URL, ENV_SEARCH_LIMIT, SearchConfigBuilder, ServiceConfig,
};
pub use contours_data as data;
pub use contours_data::{DataSource, DatasetInfo, FetchOptions};
pub use error::{ContoursError, ErrorKind};
pub use export::{ExportMode, GeometryExport};
pub use normalize::normalize;
pub use search::{EntityKey, EntityType, SearchConfig, SearchResult, TypeFilter};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

static SERVICE: OnceCell<ContoursService> = OnceCell::new();

/// Initialize logging for the contours library.
///
/// `RUST_LOG` takes precedence over `level` when set. Query engine and HTTP
/// client internals are kept at `warn`.
///
/// # Examples
///
/// ```rust
/// use contours::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), contours::error::ContoursError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), ContoursError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?)
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| ContoursError::ConfigError(format!("logger already installed: {e}")))?;
        Ok(())
    })
}

/// Open the process-wide service with `config`.
///
/// Later calls return the already opened service and ignore `config`. A
/// failed initialization leaves nothing behind, so it can be retried.
pub fn init_service(config: ServiceConfig) -> Result<&'static ContoursService, ContoursError> {
    SERVICE.get_or_try_init(|| ContoursService::from_config(&config))
}

/// The process-wide service, opened from the environment on first use
/// (see [`ServiceConfig::from_env`]).
pub fn service() -> Result<&'static ContoursService, ContoursError> {
    SERVICE.get_or_try_init(|| ContoursService::from_config(&ServiceConfig::from_env()?))
}
