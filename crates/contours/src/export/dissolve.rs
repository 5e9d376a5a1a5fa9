use std::panic::{self, AssertUnwindSafe};

use geo::{BooleanOps, Geometry, MultiPolygon};
use geozero::{ToGeo, wkb::Wkb};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Decode a WKB geometry into a MultiPolygon.
///
/// Returns `None` for geometries without area (points, lines).
pub(crate) fn decode_wkb(wkb: &[u8]) -> geozero::error::Result<Option<MultiPolygon<f64>>> {
    let geometry: Geometry<f64> = Wkb(wkb).to_geo()?;
    Ok(areal(geometry))
}

fn areal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi_polygon) => Some(multi_polygon),
        Geometry::Rect(rect) => Some(MultiPolygon::new(vec![rect.to_polygon()])),
        Geometry::Triangle(triangle) => Some(MultiPolygon::new(vec![triangle.to_polygon()])),
        Geometry::GeometryCollection(collection) => {
            let polygons: Vec<_> = collection
                .into_iter()
                .filter_map(areal)
                .flat_map(|multi_polygon| multi_polygon.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

/// Outcome of merging the geometries of a selection.
#[derive(Debug, Clone)]
pub(crate) struct Dissolved {
    pub(crate) geometry: MultiPolygon<f64>,
    /// `false` when the union failed and the parts were only collected.
    pub(crate) dissolved: bool,
}

/// Union all `parts` into one MultiPolygon with a parallel tree reduction.
///
/// Invalid input is never repaired. If the boolean ops panic on degenerate
/// rings, the parts are returned side by side instead.
pub(crate) fn dissolve(parts: Vec<MultiPolygon<f64>>) -> Dissolved {
    if parts.len() == 1 {
        return Dissolved {
            geometry: parts.into_iter().flatten().collect(),
            dissolved: true,
        };
    }

    let union = panic::catch_unwind(AssertUnwindSafe(|| {
        parts.par_iter().cloned().reduce_with(|a, b| a.union(&b))
    }));

    match union {
        Ok(geometry) => {
            let geometry = geometry.unwrap_or_else(|| MultiPolygon::new(vec![]));
            debug!(parts = parts.len(), polygons = geometry.0.len(), "Geometries dissolved");
            Dissolved {
                geometry,
                dissolved: true,
            }
        }
        Err(_) => {
            warn!(
                parts = parts.len(),
                "Union failed on degenerate geometry, exporting the parts undissolved"
            );
            Dissolved {
                geometry: parts.into_iter().flatten().collect(),
                dissolved: false,
            }
        }
    }
}
