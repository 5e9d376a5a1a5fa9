//! The [`ContoursService`] facade.
//!
//! It owns the dataset handle, the name catalog built from it on first search
//! and the default [`SearchConfig`]. Every method takes `&self`, so one
//! service can be shared between threads behind an `Arc` or a `static`.
//!
//! ```rust
//! use contours::{ContoursService, EntityType, TypeFilter};
//! use contours::data::{DataSource, TestDataConfig, create_test_data};
//!
//! let file = create_test_data(&TestDataConfig::minimal())?;
//! let service = ContoursService::open(DataSource::Local(file.path().to_path_buf()))?;
//!
//! let results = service.search("fleville", TypeFilter::All)?;
//! assert_eq!(results[0].display_name, "Fléville");
//!
//! let export = service.export(&results[0].key)?;
//! assert_eq!(export.features.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use contours_data::{BureauDataset, DataSource, DatasetInfo, FetchOptions};
use once_cell::sync::OnceCell;
use tracing::{info, instrument};

use crate::{
    config::ServiceConfig,
    error::Result,
    export::{ExportMode, GeometryExport, export_inner},
    search::{EntityKey, EntityType, NameCatalog, SearchConfig, SearchResult, TypeFilter, search_inner},
};

pub type SearchResults = Vec<SearchResult>;

/// Read-only lookup service over one contours dataset.
#[derive(Debug)]
pub struct ContoursService {
    dataset: BureauDataset,
    catalog: OnceCell<NameCatalog>,
    search_config: SearchConfig,
}

impl ContoursService {
    /// Open `source` with default fetch and search settings.
    pub fn open(source: DataSource) -> Result<Self> {
        Self::from_config(&ServiceConfig::new(source))
    }

    /// Open the dataset described by `config`, downloading it if needed.
    #[instrument(name = "Initialize ContoursService", level = "info", skip(config), fields(source = %config.source))]
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let t_init = std::time::Instant::now();
        let dataset = BureauDataset::open(&config.source, &config.fetch)?;
        info!(
            elapsed_seconds = ?t_init.elapsed(),
            records = dataset.info().record_count,
            "ContoursService initialization complete"
        );
        Ok(Self::from_dataset(dataset, config.search.clone()))
    }

    /// Wrap an already opened dataset.
    pub fn from_dataset(dataset: BureauDataset, search_config: SearchConfig) -> Self {
        Self {
            dataset,
            catalog: OnceCell::new(),
            search_config,
        }
    }

    /// Open `source` with explicit fetch options.
    pub fn with_fetch_options(source: DataSource, fetch: FetchOptions) -> Result<Self> {
        Self::from_config(&ServiceConfig::new(source).with_fetch(fetch))
    }

    pub fn dataset(&self) -> &BureauDataset {
        &self.dataset
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search_config
    }

    /// The distinct names of the dataset, built on first use.
    pub fn catalog(&self) -> Result<&NameCatalog> {
        self.catalog.get_or_try_init(|| {
            let rows = self.dataset.name_rows()?;
            Ok(NameCatalog::from_rows(&rows))
        })
    }

    /// Search entity names with the service's default configuration.
    ///
    /// Matching ignores accents, case and extra whitespace. Results are ordered
    /// by entity type (departments first), then by name.
    pub fn search(&self, query: &str, filter: TypeFilter) -> Result<SearchResults> {
        self.search_with_config(query, filter, &self.search_config)
    }

    #[instrument(name = "Search", level = "info", skip(self, config))]
    pub fn search_with_config(
        &self,
        query: &str,
        filter: TypeFilter,
        config: &SearchConfig,
    ) -> Result<SearchResults> {
        let results = search_inner(self.catalog()?, query, filter, config)?;
        info!(results = results.len(), "Search complete");
        Ok(results)
    }

    /// Dissolved GeoJSON geometry of `key`.
    pub fn export(&self, key: &EntityKey) -> Result<GeometryExport> {
        self.export_with_mode(key, ExportMode::Dissolved)
    }

    pub fn export_with_mode(&self, key: &EntityKey, mode: ExportMode) -> Result<GeometryExport> {
        Ok(export_inner(&self.dataset, key, mode)?)
    }

    /// Parse `raw` as a key of `entity_type` and export it.
    pub fn export_raw(&self, entity_type: EntityType, raw: &str) -> Result<GeometryExport> {
        let key = EntityKey::parse(entity_type, raw)?;
        self.export(&key)
    }

    pub fn info(&self) -> &DatasetInfo {
        self.dataset.info()
    }
}
