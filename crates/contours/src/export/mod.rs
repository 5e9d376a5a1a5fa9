//! GeoJSON export of the bureaux behind a resolved entity.
//!
//! A key becomes an exact filter on the lazy scan, the matching rows' WKB
//! geometries are decoded and, by default, dissolved into one MultiPolygon.
use contours_data::{BureauDataset, VotingBureauRecord, schema};
use geo::MultiPolygon;
use itertools::Itertools;
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

mod dissolve;
mod geojson;

pub use error::ExportError;
use error::Result;
pub use geojson::{Feature, FeatureGeometry, FeatureProperties, GeometryExport, Position, file_name};

use crate::search::EntityKey;
use dissolve::{decode_wkb, dissolve};

/// Shape of the exported document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportMode {
    /// One feature holding the union of every selected bureau.
    #[default]
    Dissolved,
    /// One feature per bureau, as stored in the dataset.
    PerBureau,
}

/// Exact-match predicate selecting the rows of `key`.
pub fn key_filter(key: &EntityKey) -> Expr {
    match key {
        EntityKey::Department { code } => col(schema::DEPARTMENT_CODE).eq(lit(code.as_str())),
        EntityKey::Constituency {
            department_code,
            name,
        } => col(schema::DEPARTMENT_CODE)
            .eq(lit(department_code.as_str()))
            .and(col(schema::CONSTITUENCY_NAME).eq(lit(name.as_str()))),
        EntityKey::Municipality { code } => col(schema::MUNICIPALITY_CODE).eq(lit(code.as_str())),
    }
}

/// Build the GeoJSON export of `key`.
#[instrument(name = "Export geometry", level = "info", skip(dataset, key), fields(key = %key))]
pub fn export_inner(
    dataset: &BureauDataset,
    key: &EntityKey,
    mode: ExportMode,
) -> Result<GeometryExport> {
    let t_export = std::time::Instant::now();
    let records = dataset.query(key_filter(key))?;
    if records.is_empty() {
        return Err(ExportError::NotFound {
            entity_type: key.entity_type(),
            key: key.to_string(),
        });
    }

    let decoded = decode_records(key, &records)?;
    if decoded.is_empty() {
        return Err(ExportError::NoGeometry {
            key: key.to_string(),
            rows: records.len(),
        });
    }

    let features = match mode {
        ExportMode::Dissolved => {
            let selected: Vec<&VotingBureauRecord> = decoded.iter().map(|(r, _)| *r).collect();
            let merged = dissolve(decoded.into_iter().map(|(_, g)| g).collect());
            vec![Feature {
                geometry: FeatureGeometry::from(&merged.geometry),
                properties: summary_properties(key, &selected, merged.dissolved),
            }]
        }
        ExportMode::PerBureau => decoded
            .into_iter()
            .map(|(record, geometry)| Feature {
                geometry: FeatureGeometry::from(&geometry),
                properties: summary_properties(key, &[record], false),
            })
            .collect(),
    };

    info!(
        rows = records.len(),
        features = features.len(),
        elapsed = ?t_export.elapsed(),
        "Export built"
    );
    Ok(GeometryExport { features })
}

/// Decode the geometry of every record.
///
/// A row whose WKB cannot be read fails the whole export rather than
/// serving part of the entity. Rows holding no polygon are skipped.
fn decode_records<'a>(
    key: &EntityKey,
    records: &'a [VotingBureauRecord],
) -> Result<Vec<(&'a VotingBureauRecord, MultiPolygon<f64>)>> {
    let decoded: Vec<Option<(&VotingBureauRecord, MultiPolygon<f64>)>> = records
        .par_iter()
        .map(|record| match decode_wkb(&record.geometry) {
            Ok(Some(geometry)) => Ok(Some((record, geometry))),
            Ok(None) => {
                warn!(bureau = ?record.bureau_code, "Skipping bureau without polygon geometry");
                Ok(None)
            }
            Err(e) => Err(ExportError::UndecodableGeometry {
                key: key.to_string(),
                bureau: record.bureau_code.clone(),
                reason: e.to_string(),
            }),
        })
        .collect::<Result<_>>()?;
    Ok(decoded.into_iter().flatten().collect())
}

/// Properties of a feature covering `records`; a field is set when all
/// records agree on it.
fn summary_properties(
    key: &EntityKey,
    records: &[&VotingBureauRecord],
    dissolved: bool,
) -> FeatureProperties {
    fn shared<'a>(
        records: &[&'a VotingBureauRecord],
        field: impl Fn(&'a VotingBureauRecord) -> Option<&'a str>,
    ) -> Option<String> {
        records
            .iter()
            .copied()
            .map(field)
            .all_equal_value()
            .ok()
            .flatten()
            .map(ToString::to_string)
    }

    FeatureProperties {
        entity_type: key.entity_type(),
        key: key.to_string(),
        department_code: shared(records, |r| Some(r.department_code.as_str())),
        department_name: shared(records, |r| Some(r.department_name.as_str())),
        constituency_name: shared(records, |r| Some(r.constituency_name.as_str())),
        municipality_code: shared(records, |r| Some(r.municipality_code.as_str())),
        municipality_name: shared(records, |r| Some(r.municipality_name.as_str())),
        bureau_code: shared(records, |r| r.bureau_code.as_deref()),
        bureau_count: records.len(),
        dissolved,
    }
}

mod error {
    use thiserror::Error;

    use crate::search::EntityType;

    #[derive(Error, Debug)]
    pub enum ExportError {
        #[error("No {entity_type} matches key '{key}'")]
        NotFound { entity_type: EntityType, key: String },
        #[error("None of the {rows} rows for '{key}' has a polygon geometry")]
        NoGeometry { key: String, rows: usize },
        #[error("Undecodable geometry for '{key}' (bureau {bureau:?}): {reason}")]
        UndecodableGeometry {
            key: String,
            bureau: Option<String>,
            reason: String,
        },
        #[error("Data error: {0}")]
        Data(#[from] contours_data::DataError),
    }
    pub type Result<T> = std::result::Result<T, ExportError>;
}
