//! Basic name search
//!
//! This example demonstrates the fundamental search operations:
//! - Opening a service over a dataset
//! - Accent-insensitive searches, with and without a type filter
//! - Working with search results
//!
//! Pass a parquet path or URL as first argument to search a real dataset,
//! otherwise a small synthetic one is generated.

use contours::data::{TestDataConfig, create_test_data};
use contours::{ContoursService, DataSource, EntityType, SearchConfigBuilder, TypeFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    contours::init_logging(tracing::Level::INFO)?;

    let _test_file;
    let source = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<DataSource>()?,
        None => {
            let file = create_test_data(&TestDataConfig::sample())?;
            let source = DataSource::Local(file.path().to_path_buf());
            _test_file = file;
            source
        }
    };
    let service = ContoursService::open(source)?;

    println!("Searching for 'fleville':");
    let results = service.search("fleville", TypeFilter::All)?;
    print_search_results(&results, 5);

    println!("\nDepartments matching 'CORREZE':");
    let results = service.search("CORREZE", TypeFilter::Only(EntityType::Department))?;
    print_search_results(&results, 5);

    // Ten results per entity type at most
    println!("\nCompact search for 'circonscription':");
    let config = SearchConfigBuilder::compact().build();
    let results = service.search_with_config("circonscription", TypeFilter::All, &config)?;
    print_search_results(&results, 5);

    Ok(())
}

fn print_search_results(results: &[contours::SearchResult], limit: usize) {
    for (i, result) in results.iter().take(limit).enumerate() {
        println!(
            "  {}. {} [{}] key={}",
            i + 1,
            result.label(),
            result.entity_type,
            result.key
        );
    }

    if results.len() > limit {
        println!("  ... and {} more results", results.len() - limit);
    }
}
