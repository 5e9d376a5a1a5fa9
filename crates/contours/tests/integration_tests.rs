//! Integration tests for contours lookup and export
//!
//! These tests run against the public API with a synthetic dataset written to
//! a temporary parquet file, so they never touch the network.

use std::collections::HashSet;
use std::sync::Arc;

use contours::data::{DataSource, TestDataConfig, create_test_data};
use contours::export::FeatureGeometry;
use contours::{
    ContoursError, ContoursService, EntityKey, EntityType, ErrorKind, ExportMode, GeometryExport,
    SearchConfigBuilder, TypeFilter,
};
use geo::Area;

fn setup_test_env() {
    let _ = contours::init_logging(tracing::Level::WARN);
}

fn open_sample() -> (tempfile::NamedTempFile, ContoursService) {
    setup_test_env();
    let file = create_test_data(&TestDataConfig::sample()).expect("Should write test data");
    let service = ContoursService::open(DataSource::Local(file.path().to_path_buf()))
        .expect("Should open test dataset");
    (file, service)
}

#[test]
fn test_fleville_scenario() {
    let (_file, service) = open_sample();

    let results = service
        .search("fleville", TypeFilter::All)
        .expect("Search should work");

    let fleville = results
        .iter()
        .find(|r| r.display_name == "Fléville")
        .expect("Should find the municipality Fléville");
    assert_eq!(fleville.entity_type, EntityType::Municipality);
    assert_eq!(fleville.key, EntityKey::municipality("08171"));
    assert_eq!(fleville.label(), "Fléville (08171)");
}

#[test]
fn test_municipality_export_scenario() {
    let (_file, service) = open_sample();

    let export = service
        .export(&EntityKey::municipality("54395"))
        .expect("Export should work");

    assert_eq!(export.features.len(), 1);
    let properties = &export.features[0].properties;
    assert_eq!(properties.municipality_code.as_deref(), Some("54395"));
    assert_eq!(properties.municipality_name.as_deref(), Some("Nancy"));
    assert_eq!(export.file_name(), "commune_54395.geojson");
    assert_eq!(GeometryExport::MEDIA_TYPE, "application/geo+json");
}

#[test]
fn test_accent_insensitivity() {
    let (_file, service) = open_sample();

    let pairs = [
        ("Corrèze", "correze"),
        ("CORREZE", "corrèze"),
        ("Vandœuvre-lès-Nancy", "vandoeuvre-les-nancy"),
        ("Charleville-Mézières", "charleville-mezieres"),
    ];
    for (accented, plain) in pairs {
        let a = service.search(accented, TypeFilter::All).unwrap();
        let b = service.search(plain, TypeFilter::All).unwrap();
        assert_eq!(a, b, "'{accented}' and '{plain}' should match the same entities");
    }

    // Hyphen and space are different characters.
    let results = service.search("charleville mezieres", TypeFilter::All).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_empty_query_is_invalid() {
    let (_file, service) = open_sample();

    for query in ["", "   ", "\u{301}"] {
        let err = service.search(query, TypeFilter::All).unwrap_err();
        assert!(
            matches!(err, ContoursError::InvalidQuery(_)),
            "'{query}' should be rejected, got {err:?}"
        );
        assert_eq!(err.status_code(), 400);
    }
}

#[test]
fn test_type_filter_is_respected() {
    let (_file, service) = open_sample();

    for entity_type in EntityType::ALL {
        let results = service
            .search("e", TypeFilter::Only(entity_type))
            .expect("Search should work");
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.entity_type == entity_type));
    }
}

#[test]
fn test_no_duplicates_and_stable_order() {
    let (_file, service) = open_sample();

    let config = SearchConfigBuilder::exhaustive().build();
    let results = service
        .search_with_config("e", TypeFilter::All, &config)
        .unwrap();

    let unique: HashSet<_> = results.iter().map(|r| (r.entity_type, r.key.clone())).collect();
    assert_eq!(unique.len(), results.len(), "Results should be deduplicated");

    let types: Vec<_> = results.iter().map(|r| r.entity_type).collect();
    let mut sorted = types.clone();
    sorted.sort();
    assert_eq!(types, sorted, "Departments, then constituencies, then municipalities");

    let again = service
        .search_with_config("e", TypeFilter::All, &config)
        .unwrap();
    assert_eq!(results, again);
}

#[test]
fn test_constituencies_are_scoped_by_department() {
    let (_file, service) = open_sample();

    let results = service
        .search("1ère circonscription", TypeFilter::Only(EntityType::Constituency))
        .unwrap();
    let labels: Vec<_> = results.iter().map(|r| r.label()).collect();
    assert_eq!(
        labels,
        [
            "1ère circonscription (Ardennes)",
            "1ère circonscription (Meurthe-et-Moselle)"
        ]
    );

    let ardennes = service.export(&results[0].key).unwrap();
    let meurthe = service.export(&results[1].key).unwrap();
    assert_eq!(ardennes.features[0].properties.department_code.as_deref(), Some("08"));
    assert_eq!(meurthe.features[0].properties.department_code.as_deref(), Some("54"));
    assert_ne!(
        ardennes.features[0].properties.bureau_count,
        meurthe.features[0].properties.bureau_count
    );
}

#[test]
fn test_dissolved_area_at_least_largest_input() {
    let (_file, service) = open_sample();

    for key in [EntityKey::department("54"), EntityKey::department("08")] {
        let bureaux = service.export_with_mode(&key, ExportMode::PerBureau).unwrap();
        let max_input = bureaux
            .features
            .iter()
            .map(|f| f.geometry.to_multi_polygon().unsigned_area())
            .fold(0.0, f64::max);

        let dissolved = service.export(&key).unwrap();
        assert_eq!(dissolved.features.len(), 1);
        let area = dissolved.features[0].geometry.to_multi_polygon().unsigned_area();
        assert!(area >= max_input - 1e-12, "{key}: {area} < {max_input}");
        // Adjacent bureaux merge into a single polygon.
        let FeatureGeometry::MultiPolygon(polygons) = &dissolved.features[0].geometry;
        assert_eq!(polygons.len(), 1);
    }
}

#[test]
fn test_unknown_keys_are_not_found() {
    let (_file, service) = open_sample();

    for key in [
        EntityKey::department("975"),
        EntityKey::municipality("54999"),
        EntityKey::constituency("08", "2ème circonscription"),
    ] {
        let err = service.export(&key).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{key} should not be found");
        assert_eq!(err.status_code(), 404);
    }
}

#[test]
fn test_geojson_round_trip() {
    let (_file, service) = open_sample();

    let export = service.export(&EntityKey::department("19")).unwrap();
    let bytes = export.to_vec().unwrap();
    let parsed = GeometryExport::from_slice(&bytes).unwrap();
    assert_eq!(parsed, export);

    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"][0]["type"], "Feature");
    assert_eq!(value["features"][0]["geometry"]["type"], "MultiPolygon");
    assert_eq!(value["features"][0]["properties"]["key"], "19");
}

#[test]
fn test_invalid_geometry_does_not_fail_export() {
    let (_file, service) = open_sample();

    // Brive-la-Gaillarde holds a self-intersecting bureau.
    let export = service
        .export(&EntityKey::municipality("19031"))
        .expect("Invalid topology should not fail the export");
    assert_eq!(export.features.len(), 1);
    assert_eq!(export.features[0].properties.bureau_count, 2);
}

#[test]
fn test_info() {
    let (file, service) = open_sample();

    let info = service.info();
    assert_eq!(info.record_count, TestDataConfig::sample().row_count());
    assert_eq!(info.source, file.path().display().to_string());
}

#[test]
fn test_missing_dataset_is_unavailable() {
    setup_test_env();

    let err = ContoursService::open(DataSource::Local("/does/not/exist.parquet".into()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    assert_eq!(err.status_code(), 503);
}

#[test]
fn test_concurrent_queries() {
    let (_file, service) = open_sample();
    let service = Arc::new(service);

    let handles: Vec<_> = ["nancy", "fleville", "correze", "ardennes"]
        .into_iter()
        .map(|query| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let results = service.search(query, TypeFilter::All).unwrap();
                let export = service.export(&results[0].key).unwrap();
                (results.len(), export.features.len())
            })
        })
        .collect();

    for handle in handles {
        let (results, features) = handle.join().expect("Thread should not panic");
        assert!(results > 0);
        assert_eq!(features, 1);
    }
}
