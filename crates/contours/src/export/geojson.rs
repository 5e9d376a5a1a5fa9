//! RFC 7946 GeoJSON documents produced by the export.
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::search::{CONSTITUENCY_KEY_SEPARATOR, EntityKey, EntityType};

/// `[longitude, latitude]`
pub type Position = [f64; 2];

/// A GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct GeometryExport {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: FeatureGeometry,
    pub properties: FeatureProperties,
}

/// Polygon rings as nested positions; every exported geometry is a MultiPolygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum FeatureGeometry {
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// Identifiers attached to an exported feature.
///
/// Administrative fields are only present when every bureau in the feature
/// shares the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub entity_type: EntityType,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constituency_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bureau_code: Option<String>,
    /// Number of source rows merged into the feature.
    pub bureau_count: usize,
    /// Whether the geometry is the union of the rows (`false` when the rows
    /// were kept as separate polygons).
    pub dissolved: bool,
}

impl GeometryExport {
    /// IANA media type of the serialized document.
    pub const MEDIA_TYPE: &'static str = "application/geo+json";

    pub fn to_geojson_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Download file name, e.g. `commune_54395.geojson`.
    pub fn file_name(&self) -> String {
        self.features.first().map_or_else(
            || "contours.geojson".to_string(),
            |feature| file_name_for(feature.properties.entity_type, &feature.properties.key),
        )
    }
}

/// File name for the export of `key`.
pub fn file_name(key: &EntityKey) -> String {
    file_name_for(key.entity_type(), &key.to_string())
}

fn file_name_for(entity_type: EntityType, key: &str) -> String {
    let parts: Vec<String> = key.split(CONSTITUENCY_KEY_SEPARATOR).map(slug).collect();
    format!("{entity_type}_{}.geojson", parts.join("_"))
}

fn slug(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in normalize(part).chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

fn ring(line: &LineString<f64>) -> Vec<Position> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

impl From<&MultiPolygon<f64>> for FeatureGeometry {
    fn from(multi_polygon: &MultiPolygon<f64>) -> Self {
        let polygons: Vec<Vec<Vec<Position>>> = multi_polygon
            .iter()
            .map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(ring)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self::MultiPolygon(polygons)
    }
}

impl FeatureGeometry {
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        let Self::MultiPolygon(polygons) = self;
        let line = |positions: &Vec<Position>| -> LineString<f64> {
            positions.iter().map(|&[x, y]| Coord { x, y }).collect()
        };
        polygons
            .iter()
            .filter_map(|rings| {
                let (exterior, interiors) = rings.split_first()?;
                Some(Polygon::new(line(exterior), interiors.iter().map(line).collect()))
            })
            .collect()
    }
}
