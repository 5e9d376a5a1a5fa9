//! GeoJSON export
//!
//! Resolves a municipality by name, then writes its dissolved contours and the
//! per-bureau contours of its department as GeoJSON files in the current
//! directory.

use anyhow::{Context, Result};
use contours::data::{TestDataConfig, create_test_data};
use contours::{
    ContoursService, DataSource, EntityKey, EntityType, ExportMode, GeometryExport, TypeFilter,
};

fn main() -> Result<()> {
    contours::init_logging(tracing::Level::INFO)?;

    let file = create_test_data(&TestDataConfig::sample())?;
    let service = ContoursService::open(DataSource::Local(file.path().to_path_buf()))?;
    let info = service.info();
    println!(
        "Dataset of {} bureaux, updated {}",
        info.record_count, info.last_updated
    );

    let nancy = service
        .search("nancy", TypeFilter::Only(EntityType::Municipality))?
        .into_iter()
        .find(|r| r.display_name == "Nancy")
        .context("Nancy not found")?;

    let export = service.export(&nancy.key)?;
    write(&export)?;

    let department = EntityKey::department("54");
    let per_bureau = service.export_with_mode(&department, ExportMode::PerBureau)?;
    write(&per_bureau)?;

    Ok(())
}

fn write(export: &GeometryExport) -> Result<()> {
    let path = export.file_name();
    std::fs::write(&path, export.to_vec()?).with_context(|| format!("writing {path}"))?;
    println!(
        "Wrote {path} ({} features, {})",
        export.features.len(),
        GeometryExport::MEDIA_TYPE
    );
    Ok(())
}
