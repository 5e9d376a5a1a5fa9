use itertools::Itertools;
use tracing::{debug, instrument};

use super::{EntityType, NameCatalog, Result, SearchError, SearchResult, TypeFilter};
use crate::config::SearchConfigBuilder;
use crate::normalize::normalize;

/// Configuration for name searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of results to return
    pub limit: usize,
    /// Maximum number of results per entity type, applied before `limit`
    pub per_type_limit: Option<usize>,
    /// Also match department and municipality codes
    pub match_codes: bool,
    /// Longest accepted query, in characters
    pub max_query_chars: usize,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            per_type_limit: None,
            match_codes: true,
            max_query_chars: 200,
        }
    }
}

fn validate_query(query: &str, config: &SearchConfig) -> Result<String> {
    let len = query.chars().count();
    if len > config.max_query_chars {
        return Err(SearchError::QueryTooLong {
            len,
            max: config.max_query_chars,
        });
    }
    let needle = normalize(query);
    if needle.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    Ok(needle)
}

/// Run `query` against the catalog.
///
/// Families are visited in priority order and each family is already sorted
/// by folded name then key, so the output order never depends on row order.
#[instrument(name = "Name search", level = "debug", skip(catalog, config))]
pub fn search_inner(
    catalog: &NameCatalog,
    query: &str,
    filter: TypeFilter,
    config: &SearchConfig,
) -> Result<Vec<SearchResult>> {
    let folded = validate_query(query, config)?;
    let needle = folded.as_str();

    let results = EntityType::ALL
        .into_iter()
        .filter(|entity_type| filter.includes(*entity_type))
        .flat_map(move |entity_type| {
            catalog
                .family(entity_type)
                .iter()
                .filter(move |entry| entry.matches(needle, config.match_codes))
                .take(config.per_type_limit.unwrap_or(usize::MAX))
        })
        .map(|entry| entry.result.clone())
        .take(config.limit)
        .collect_vec();

    debug!(needle = %needle, results = results.len(), "Search complete");
    Ok(results)
}
