use ahash::AHashMap as HashMap;
use contours_data::NameRow;
use rayon::prelude::*;
use tracing::{info, instrument};

use super::{EntityKey, EntityType, SearchResult};
use crate::normalize::normalize;

#[derive(Debug, Clone)]
pub(super) struct CatalogEntry {
    pub(super) result: SearchResult,
    pub(super) normalized_name: String,
    /// Folded code for families searchable by code (departments, municipalities).
    pub(super) normalized_code: Option<String>,
}

impl CatalogEntry {
    fn new(result: SearchResult) -> Self {
        let normalized_name = normalize(&result.display_name);
        let normalized_code = match &result.key {
            EntityKey::Department { code } | EntityKey::Municipality { code } => {
                Some(normalize(code))
            }
            EntityKey::Constituency { .. } => None,
        };
        Self {
            result,
            normalized_name,
            normalized_code,
        }
    }

    pub(super) fn matches(&self, needle: &str, match_codes: bool) -> bool {
        self.normalized_name.contains(needle)
            || (match_codes
                && self
                    .normalized_code
                    .as_deref()
                    .is_some_and(|code| code.contains(needle)))
    }
}

/// Distinct searchable entities of the dataset, one list per family, each
/// sorted by folded name then key.
#[derive(Debug, Clone, Default)]
pub struct NameCatalog {
    departments: Vec<CatalogEntry>,
    constituencies: Vec<CatalogEntry>,
    municipalities: Vec<CatalogEntry>,
}

impl NameCatalog {
    /// Build the catalog from the descriptive columns of every dataset row.
    #[instrument(name = "Build name catalog", level = "info", skip_all, fields(rows = rows.len()))]
    pub fn from_rows(rows: &[NameRow]) -> Self {
        let mut distinct: HashMap<EntityKey, SearchResult> = HashMap::new();
        for row in rows {
            let department = EntityKey::department(&row.department_code);
            let constituency = EntityKey::constituency(&row.department_code, &row.constituency_name);
            let municipality = EntityKey::municipality(&row.municipality_code);

            for (key, display_name) in [
                (department, &row.department_name),
                (constituency, &row.constituency_name),
                (municipality, &row.municipality_name),
            ] {
                distinct.entry(key).or_insert_with_key(|key| SearchResult {
                    entity_type: key.entity_type(),
                    display_name: display_name.clone(),
                    key: key.clone(),
                    department_name: row.department_name.clone(),
                });
            }
        }

        let results: Vec<SearchResult> = distinct.into_iter().map(|(_, result)| result).collect();
        let mut entries: Vec<CatalogEntry> =
            results.into_par_iter().map(CatalogEntry::new).collect();
        entries.par_sort_unstable_by(|a, b| {
            (a.result.entity_type, &a.normalized_name, &a.result.key).cmp(&(
                b.result.entity_type,
                &b.normalized_name,
                &b.result.key,
            ))
        });

        let mut catalog = Self::default();
        for entry in entries {
            match entry.result.entity_type {
                EntityType::Department => catalog.departments.push(entry),
                EntityType::Constituency => catalog.constituencies.push(entry),
                EntityType::Municipality => catalog.municipalities.push(entry),
            }
        }
        info!(
            departments = catalog.departments.len(),
            constituencies = catalog.constituencies.len(),
            municipalities = catalog.municipalities.len(),
            "Name catalog built"
        );
        catalog
    }

    pub(super) fn family(&self, entity_type: EntityType) -> &[CatalogEntry] {
        match entity_type {
            EntityType::Department => &self.departments,
            EntityType::Constituency => &self.constituencies,
            EntityType::Municipality => &self.municipalities,
        }
    }

    /// Number of distinct entities of `entity_type`.
    pub fn len(&self, entity_type: EntityType) -> usize {
        self.family(entity_type).len()
    }

    pub fn is_empty(&self) -> bool {
        EntityType::ALL.iter().all(|t| self.family(*t).is_empty())
    }
}
