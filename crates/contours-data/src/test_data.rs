//! Synthetic contours datasets for tests and demos.
//!
//! The generated file has the same columns as the published dataset, with a
//! WKB geometry column. Bureaux of a department are laid out as adjacent
//! rectangles, so dissolving any administrative unit yields one polygon.
use geo::{Geometry, MultiPolygon, Polygon, coord, polygon};
use geozero::{CoordDimensions, ToWkb};
use polars::prelude::*;
use tempfile::NamedTempFile;
use tracing::info;

use super::{Result, schema};

/// (department code, department name, constituency, municipality code, municipality name)
type MunicipalityRow = (&'static str, &'static str, &'static str, &'static str, &'static str);

const MUNICIPALITIES: &[MunicipalityRow] = &[
    ("08", "Ardennes", "1ère circonscription", "08105", "Charleville-Mézières"),
    ("08", "Ardennes", "3ème circonscription", "08171", "Fléville"),
    ("19", "Corrèze", "2ème circonscription", "19031", "Brive-la-Gaillarde"),
    ("54", "Meurthe-et-Moselle", "1ère circonscription", "54395", "Nancy"),
    ("54", "Meurthe-et-Moselle", "1ère circonscription", "54304", "Laxou"),
    ("54", "Meurthe-et-Moselle", "2ème circonscription", "54197", "Fléville-devant-Nancy"),
    ("54", "Meurthe-et-Moselle", "2ème circonscription", "54547", "Vandœuvre-lès-Nancy"),
];

const MINIMAL_MUNICIPALITIES: &[&str] = &["08171", "54395"];

/// Width and height of one bureau rectangle, in degrees.
pub const BUREAU_SIZE: f64 = 0.02;

/// Configuration for test data generation
#[derive(Debug, Clone)]
pub struct TestDataConfig {
    /// Number of bureaux generated for each municipality
    pub bureaux_per_municipality: usize,
    /// Restrict the dataset to a handful of municipalities
    pub minimal: bool,
    /// Replace the last Brive-la-Gaillarde bureau with a self-intersecting polygon
    pub include_invalid_geometry: bool,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self::sample()
    }
}

impl TestDataConfig {
    /// Minimal data for unit tests
    pub fn minimal() -> Self {
        Self {
            bureaux_per_municipality: 1,
            minimal: true,
            include_invalid_geometry: false,
        }
    }

    /// Sample data for integration tests
    pub fn sample() -> Self {
        Self {
            bureaux_per_municipality: 2,
            minimal: false,
            include_invalid_geometry: true,
        }
    }

    fn municipalities(&self) -> impl Iterator<Item = &'static MunicipalityRow> + '_ {
        MUNICIPALITIES
            .iter()
            .filter(move |row| !self.minimal || MINIMAL_MUNICIPALITIES.contains(&row.3))
    }

    /// Number of rows the generated file holds.
    pub fn row_count(&self) -> usize {
        self.municipalities().count() * self.bureaux_per_municipality
    }
}

fn department_origin(department_code: &str) -> (f64, f64) {
    match department_code {
        "08" => (4.70, 49.70),
        "19" => (1.50, 45.10),
        _ => (6.10, 48.60),
    }
}

/// Left and right edges of the bureau in `slot`, computed the same way for
/// every slot so neighbours share their edge exactly.
fn slot_edges(x0: f64, slot: usize) -> (f64, f64) {
    (
        (slot as f64).mul_add(BUREAU_SIZE, x0),
        ((slot + 1) as f64).mul_add(BUREAU_SIZE, x0),
    )
}

fn rectangle((left, right): (f64, f64), y: f64) -> Polygon<f64> {
    polygon![
        (x: left, y: y),
        (x: right, y: y),
        (x: right, y: y + BUREAU_SIZE),
        (x: left, y: y + BUREAU_SIZE),
        (x: left, y: y),
    ]
}

fn bowtie((left, right): (f64, f64), y: f64) -> Polygon<f64> {
    Polygon::new(
        vec![
            coord! { x: left, y: y },
            coord! { x: right, y: y + BUREAU_SIZE },
            coord! { x: right, y: y },
            coord! { x: left, y: y + BUREAU_SIZE },
            coord! { x: left, y: y },
        ]
        .into(),
        vec![],
    )
}

/// Write a synthetic contours dataset to a temporary parquet file.
pub fn create_test_data(config: &TestDataConfig) -> Result<NamedTempFile> {
    info!("Creating test data with config: {:?}", config);

    let mut department_codes = Vec::new();
    let mut department_names = Vec::new();
    let mut constituencies = Vec::new();
    let mut municipality_codes = Vec::new();
    let mut municipality_names = Vec::new();
    let mut bureau_codes = Vec::new();
    let mut geometries: Vec<Vec<u8>> = Vec::new();

    let mut slot_in_department = SlotCounter::default();
    for &(dep_code, dep_name, constituency, com_code, com_name) in config.municipalities() {
        for n in 1..=config.bureaux_per_municipality {
            let slot = slot_in_department.next(dep_code);
            let (x0, y0) = department_origin(dep_code);
            let edges = slot_edges(x0, slot);

            let is_last_brive = com_code == "19031" && n == config.bureaux_per_municipality;
            let geometry = if config.include_invalid_geometry && is_last_brive {
                Geometry::Polygon(bowtie(edges, y0))
            } else if n % 2 == 0 {
                Geometry::MultiPolygon(MultiPolygon::new(vec![rectangle(edges, y0)]))
            } else {
                Geometry::Polygon(rectangle(edges, y0))
            };

            department_codes.push(dep_code);
            department_names.push(dep_name);
            constituencies.push(constituency);
            municipality_codes.push(com_code);
            municipality_names.push(com_name);
            bureau_codes.push(format!("{com_code}_{n:04}"));
            geometries.push(geometry.to_wkb(CoordDimensions::xy())?);
        }
    }

    let wkbs: Vec<&[u8]> = geometries.iter().map(Vec::as_slice).collect();
    let mut df = DataFrame::new(vec![
        Column::new(schema::DEPARTMENT_CODE.into(), department_codes),
        Column::new(schema::DEPARTMENT_NAME.into(), department_names),
        Column::new(schema::CONSTITUENCY_NAME.into(), constituencies),
        Column::new(schema::MUNICIPALITY_CODE.into(), municipality_codes),
        Column::new(schema::MUNICIPALITY_NAME.into(), municipality_names),
        Column::new(schema::BUREAU_CODE.into(), bureau_codes),
        Column::new(schema::GEOMETRY.into(), wkbs),
    ])?;

    let mut file = NamedTempFile::with_suffix(".parquet")?;
    ParquetWriter::new(file.as_file_mut()).finish(&mut df)?;
    info!(rows = df.height(), path = ?file.path(), "Test data written");
    Ok(file)
}

/// Running index of bureaux within each department.
#[derive(Default)]
struct SlotCounter(Vec<(&'static str, usize)>);

impl SlotCounter {
    fn next(&mut self, department: &'static str) -> usize {
        if let Some(entry) = self.0.iter_mut().find(|(dep, _)| *dep == department) {
            entry.1 += 1;
            entry.1
        } else {
            self.0.push((department, 0));
            0
        }
    }
}
