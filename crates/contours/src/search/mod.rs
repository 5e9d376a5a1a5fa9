//! Search over department, constituency and municipality names.
//!
//! Matching is a substring test on accent-folded text (see
//! [`crate::normalize`]); results are deduplicated per entity and ordered by
//! entity type, then name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

pub use error::SearchError;
mod catalog;
mod search_orchestration;

pub use catalog::NameCatalog;
use error::Result;
pub use search_orchestration::{SearchConfig, search_inner};

/// Administrative level a search result or export refers to.
///
/// The declaration order is the result ordering priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "departement")]
    Department,
    #[serde(rename = "circonscription")]
    Constituency,
    #[serde(rename = "commune")]
    Municipality,
}

impl EntityType {
    pub const ALL: [Self; 3] = [Self::Department, Self::Constituency, Self::Municipality];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Department => "departement",
            Self::Constituency => "circonscription",
            Self::Municipality => "commune",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "departement" | "department" => Ok(Self::Department),
            "circonscription" | "constituency" => Ok(Self::Constituency),
            "commune" | "municipality" => Ok(Self::Municipality),
            other => Err(SearchError::UnknownEntityType(other.to_string())),
        }
    }
}

/// Which entity families a search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(EntityType),
}

impl TypeFilter {
    pub fn includes(self, entity_type: EntityType) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == entity_type,
        }
    }
}

impl From<EntityType> for TypeFilter {
    fn from(entity_type: EntityType) -> Self {
        Self::Only(entity_type)
    }
}

impl FromStr for TypeFilter {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "all" | "ALL" | "All" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

/// A fully resolved administrative entity.
///
/// Constituency names are only unique within a department, so their key
/// carries the department code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Department { code: String },
    Constituency { department_code: String, name: String },
    Municipality { code: String },
}

/// Separator between department code and constituency name in a key string.
pub const CONSTITUENCY_KEY_SEPARATOR: char = ':';

impl EntityKey {
    pub fn department(code: impl Into<String>) -> Self {
        Self::Department { code: code.into() }
    }

    pub fn constituency(department_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Constituency {
            department_code: department_code.into(),
            name: name.into(),
        }
    }

    pub fn municipality(code: impl Into<String>) -> Self {
        Self::Municipality { code: code.into() }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Department { .. } => EntityType::Department,
            Self::Constituency { .. } => EntityType::Constituency,
            Self::Municipality { .. } => EntityType::Municipality,
        }
    }

    /// Parse the string form produced by [`fmt::Display`] for `entity_type`.
    ///
    /// Department and municipality keys are bare codes; constituency keys are
    /// `"<department code>:<constituency name>"`.
    pub fn parse(entity_type: EntityType, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = |reason: &'static str| SearchError::InvalidKey {
            entity_type,
            key: raw.to_string(),
            reason,
        };
        if raw.is_empty() {
            return Err(invalid("key is empty"));
        }
        match entity_type {
            EntityType::Department => Ok(Self::department(raw)),
            EntityType::Municipality => Ok(Self::municipality(raw)),
            EntityType::Constituency => {
                let (department_code, name) = raw
                    .split_once(CONSTITUENCY_KEY_SEPARATOR)
                    .ok_or_else(|| invalid("expected '<department code>:<constituency name>'"))?;
                let (department_code, name) = (department_code.trim(), name.trim());
                if department_code.is_empty() || name.is_empty() {
                    return Err(invalid("department code and constituency name are required"));
                }
                Ok(Self::constituency(department_code, name))
            }
        }
    }

    pub fn department_code(&self) -> Option<&str> {
        match self {
            Self::Department { code } => Some(code),
            Self::Constituency {
                department_code, ..
            } => Some(department_code),
            Self::Municipality { .. } => None,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Department { code } | Self::Municipality { code } => f.write_str(code),
            Self::Constituency {
                department_code,
                name,
            } => write!(f, "{department_code}{CONSTITUENCY_KEY_SEPARATOR}{name}"),
        }
    }
}

impl Serialize for EntityKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One matched entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub entity_type: EntityType,
    /// Name as it appears in the dataset, accents included.
    pub display_name: String,
    /// Key to pass to the export.
    pub key: EntityKey,
    /// Name of the department the entity belongs to.
    pub department_name: String,
}

impl SearchResult {
    /// Human label in the style of the download page:
    /// `"54 - Meurthe-et-Moselle"`, `"1ère circonscription (Meurthe-et-Moselle)"`,
    /// `"Nancy (54395)"`.
    pub fn label(&self) -> String {
        match &self.key {
            EntityKey::Department { code } => format!("{code} - {}", self.display_name),
            EntityKey::Constituency { .. } => {
                format!("{} ({})", self.display_name, self.department_name)
            }
            EntityKey::Municipality { code } => format!("{} ({code})", self.display_name),
        }
    }
}

mod error {
    use thiserror::Error;

    use super::EntityType;

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("Search query is empty")]
        EmptyQuery,
        #[error("Search query is {len} characters long, the maximum is {max}")]
        QueryTooLong { len: usize, max: usize },
        #[error("Invalid {entity_type} key '{key}': {reason}")]
        InvalidKey {
            entity_type: EntityType,
            key: String,
            reason: &'static str,
        },
        #[error("Unknown entity type '{0}'")]
        UnknownEntityType(String),
        #[error("Data error: {0}")]
        Data(#[from] contours_data::DataError),
    }
    pub type Result<T> = std::result::Result<T, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trip() {
        for entity_type in EntityType::ALL {
            assert_eq!(entity_type.to_string().parse::<EntityType>().unwrap(), entity_type);
        }
        assert_eq!("municipality".parse::<EntityType>().unwrap(), EntityType::Municipality);
        assert!("region".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_entity_type_priority_order() {
        assert!(EntityType::Department < EntityType::Constituency);
        assert!(EntityType::Constituency < EntityType::Municipality);
    }

    #[test]
    fn test_type_filter() {
        assert_eq!("all".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!("".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        let only = "commune".parse::<TypeFilter>().unwrap();
        assert!(only.includes(EntityType::Municipality));
        assert!(!only.includes(EntityType::Department));
        assert!(TypeFilter::All.includes(EntityType::Constituency));
    }

    #[test]
    fn test_constituency_key_round_trip() {
        let key = EntityKey::constituency("54", "1ère circonscription");
        assert_eq!(key.to_string(), "54:1ère circonscription");
        assert_eq!(
            EntityKey::parse(EntityType::Constituency, &key.to_string()).unwrap(),
            key
        );
    }

    #[test]
    fn test_constituency_key_requires_department() {
        let err = EntityKey::parse(EntityType::Constituency, "1ère circonscription").unwrap_err();
        assert!(matches!(err, SearchError::InvalidKey { .. }));
        assert!(EntityKey::parse(EntityType::Constituency, ":name").is_err());
        assert!(EntityKey::parse(EntityType::Municipality, "  ").is_err());
    }

    #[test]
    fn test_labels() {
        let result = SearchResult {
            entity_type: EntityType::Municipality,
            display_name: "Nancy".to_string(),
            key: EntityKey::municipality("54395"),
            department_name: "Meurthe-et-Moselle".to_string(),
        };
        assert_eq!(result.label(), "Nancy (54395)");

        let result = SearchResult {
            entity_type: EntityType::Constituency,
            display_name: "1ère circonscription".to_string(),
            key: EntityKey::constituency("54", "1ère circonscription"),
            department_name: "Meurthe-et-Moselle".to_string(),
        };
        assert_eq!(result.label(), "1ère circonscription (Meurthe-et-Moselle)");
    }

    #[test]
    fn test_search_result_serializes_key_as_string() {
        let result = SearchResult {
            entity_type: EntityType::Department,
            display_name: "Corrèze".to_string(),
            key: EntityKey::department("19"),
            department_name: "Corrèze".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["entity_type"], "departement");
        assert_eq!(json["key"], "19");
    }
}
