use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Result;

/// Published files are stamped `YYYYMMDD_<name>.parquet`.
static DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8})_").expect("valid date prefix pattern"));

/// Descriptive facts about the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub last_updated: NaiveDate,
    pub source: String,
    pub record_count: usize,
}

/// Publication date encoded in a dataset file name, if any.
pub fn date_from_file_name(file_name: &str) -> Option<NaiveDate> {
    let captures = DATE_PREFIX.captures(file_name)?;
    NaiveDate::parse_from_str(&captures[1], "%Y%m%d").ok()
}

/// Publication date of the dataset: the file name stamp, or the file's
/// modification date when the name carries none.
pub(crate) fn last_updated(file_name: &str, path: &Path) -> Result<NaiveDate> {
    if let Some(date) = date_from_file_name(file_name) {
        return Ok(date);
    }
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified).date_naive())
}
