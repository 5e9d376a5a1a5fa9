use std::str::FromStr;

use contours_data::{DataSource, FetchOptions};

use crate::{error::ContoursError, search::SearchConfig};

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// At most ten results per entity type, like the public download page
    pub fn compact() -> Self {
        let mut builder = Self::new();
        builder.config.limit = 30;
        builder.config.per_type_limit = Some(10);
        builder
    }

    /// Every match, no per-type cap
    pub fn exhaustive() -> Self {
        let mut builder = Self::new();
        builder.config.limit = usize::MAX;
        builder.config.per_type_limit = None;
        builder
    }

    /// Set the maximum number of results to return
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Cap the number of results of each entity type
    pub fn per_type_limit(mut self, limit: usize) -> Self {
        self.config.per_type_limit = Some(limit);
        self
    }

    /// Enable or disable matching on department and municipality codes
    pub fn match_codes(mut self, enabled: bool) -> Self {
        self.config.match_codes = enabled;
        self
    }

    /// Set the longest accepted query, in characters
    pub fn max_query_chars(mut self, max: usize) -> Self {
        self.config.max_query_chars = max;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// Environment variable holding the dataset URL or local path.
pub const ENV_PARQUET_URL: &str = "CONTOURS_PARQUET_URL";
/// Environment variable holding the number of download attempts.
pub const ENV_FETCH_ATTEMPTS: &str = "CONTOURS_FETCH_ATTEMPTS";
/// Environment variable holding the default search result limit.
pub const ENV_SEARCH_LIMIT: &str = "CONTOURS_SEARCH_LIMIT";

/// Everything needed to open a [`crate::ContoursService`].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub source: DataSource,
    pub fetch: FetchOptions,
    pub search: SearchConfig,
}

impl ServiceConfig {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    pub fn with_fetch(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ContoursError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value. Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ContoursError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_PARQUET_URL) {
            config.source = DataSource::from_str(raw.trim())
                .map_err(|e| ContoursError::ConfigError(format!("{ENV_PARQUET_URL}: {e}")))?;
        }
        if let Some(raw) = get(ENV_FETCH_ATTEMPTS) {
            let attempts: u32 = parse_positive(ENV_FETCH_ATTEMPTS, &raw)?;
            config.fetch.max_attempts = attempts;
        }
        if let Some(raw) = get(ENV_SEARCH_LIMIT) {
            config.search.limit = parse_positive(ENV_SEARCH_LIMIT, &raw)?;
        }
        Ok(config)
    }
}

fn parse_positive<T>(name: &str, raw: &str) -> Result<T, ContoursError>
where
    T: FromStr + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ContoursError::ConfigError(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_builder() {
        let config = SearchConfigBuilder::new().build();
        assert_eq!(config.limit, 50);
        assert_eq!(config.per_type_limit, None);
        assert!(config.match_codes);
        assert_eq!(config.max_query_chars, 200);
    }

    #[test]
    fn test_compact_preset() {
        let config = SearchConfigBuilder::compact().build();
        assert_eq!(config.per_type_limit, Some(10));
        assert_eq!(config.limit, 30);
    }

    #[test]
    fn test_exhaustive_preset() {
        let config = SearchConfigBuilder::exhaustive().build();
        assert_eq!(config.limit, usize::MAX);
        assert_eq!(config.per_type_limit, None);
    }

    #[test]
    fn test_method_chaining() {
        let config = SearchConfigBuilder::new()
            .limit(5)
            .per_type_limit(2)
            .match_codes(false)
            .max_query_chars(64)
            .build();

        assert_eq!(config.limit, 5);
        assert_eq!(config.per_type_limit, Some(2));
        assert!(!config.match_codes);
        assert_eq!(config.max_query_chars, 64);
    }

    #[test]
    fn test_search_config_builder_override_presets() {
        let config = SearchConfigBuilder::compact()
            .limit(100) // Override the compact preset limit
            .build();

        assert_eq!(config.limit, 100);
        assert_eq!(config.per_type_limit, Some(10)); // Should keep compact preset value
    }

    #[test]
    fn test_service_config_defaults_without_env() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.source, DataSource::default());
        assert_eq!(config.fetch.max_attempts, FetchOptions::default().max_attempts);
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_service_config_from_lookup() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (ENV_PARQUET_URL, "/tmp/contours.parquet"),
            (ENV_FETCH_ATTEMPTS, "5"),
            (ENV_SEARCH_LIMIT, " 12 "),
        ]))
        .unwrap();

        assert_eq!(
            config.source,
            DataSource::Local(PathBuf::from("/tmp/contours.parquet"))
        );
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.search.limit, 12);
    }

    #[test]
    fn test_service_config_remote_url() {
        let url = "https://example.org/20240101_contours.parquet";
        let config = ServiceConfig::from_lookup(lookup(&[(ENV_PARQUET_URL, url)])).unwrap();
        assert_eq!(config.source, DataSource::Remote(url.to_string()));
    }

    #[test]
    fn test_service_config_blank_values_keep_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[(ENV_SEARCH_LIMIT, "  ")])).unwrap();
        assert_eq!(config.search.limit, 50);
    }

    #[test]
    fn test_service_config_invalid_values() {
        for vars in [
            [(ENV_FETCH_ATTEMPTS, "0")],
            [(ENV_FETCH_ATTEMPTS, "three")],
            [(ENV_SEARCH_LIMIT, "-1")],
        ] {
            let err = ServiceConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ContoursError::ConfigError(_)), "{err:?}");
        }
    }
}
