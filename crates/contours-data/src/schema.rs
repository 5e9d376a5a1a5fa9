//! Fixed record schema of the contours dataset.
//!
//! Column lookups by name only happen here; everything downstream works with
//! [`VotingBureauRecord`] and [`NameRow`].
use itertools::izip;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::{DataError, Result};

pub const DEPARTMENT_CODE: &str = "codeDepartement";
pub const DEPARTMENT_NAME: &str = "nomDepartement";
pub const CONSTITUENCY_NAME: &str = "nomCirconscription";
pub const MUNICIPALITY_CODE: &str = "codeCommune";
pub const MUNICIPALITY_NAME: &str = "nomCommune";
pub const BUREAU_CODE: &str = "codeBureauVote";
pub const GEOMETRY: &str = "geometry";

/// Descriptive columns every dataset must provide.
pub const NAME_COLUMNS: [&str; 5] = [
    DEPARTMENT_CODE,
    DEPARTMENT_NAME,
    CONSTITUENCY_NAME,
    MUNICIPALITY_CODE,
    MUNICIPALITY_NAME,
];

/// Columns required for the dataset to be served at all.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    DEPARTMENT_CODE,
    DEPARTMENT_NAME,
    CONSTITUENCY_NAME,
    MUNICIPALITY_CODE,
    MUNICIPALITY_NAME,
    GEOMETRY,
];

/// One bureau de vote: its administrative attachments and its WKB geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotingBureauRecord {
    pub department_code: String,
    pub department_name: String,
    pub constituency_name: String,
    pub municipality_code: String,
    pub municipality_name: String,
    pub bureau_code: Option<String>,
    /// Well-Known Binary, as stored in the GeoParquet geometry column.
    pub geometry: Vec<u8>,
}

/// The descriptive part of a record, without geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameRow {
    pub department_code: String,
    pub department_name: String,
    pub constituency_name: String,
    pub municipality_code: String,
    pub municipality_name: String,
}

/// Check that `schema` carries every required column.
pub fn validate_schema(schema: &Schema) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if schema.get(column).is_none() {
            return Err(DataError::MissingColumn(column));
        }
    }
    Ok(())
}

/// Projection of the descriptive columns, cast to strings so that numeric
/// codes in a producer's file do not leak into the typed layer.
pub(crate) fn name_exprs() -> Vec<Expr> {
    NAME_COLUMNS
        .iter()
        .map(|name| col(*name).cast(DataType::String))
        .collect()
}

/// Projection used for full records. The bureau code is only selected when
/// the dataset has it.
pub(crate) fn record_exprs(has_bureau_code: bool) -> Vec<Expr> {
    let mut exprs = name_exprs();
    if has_bureau_code {
        exprs.push(col(BUREAU_CODE).cast(DataType::String));
    }
    exprs.push(col(GEOMETRY));
    exprs
}

pub(crate) fn name_rows_from_df(df: &DataFrame) -> Result<Vec<NameRow>> {
    let department_code = df.column(DEPARTMENT_CODE)?.str()?;
    let department_name = df.column(DEPARTMENT_NAME)?.str()?;
    let constituency_name = df.column(CONSTITUENCY_NAME)?.str()?;
    let municipality_code = df.column(MUNICIPALITY_CODE)?.str()?;
    let municipality_name = df.column(MUNICIPALITY_NAME)?.str()?;

    let rows = izip!(
        department_code,
        department_name,
        constituency_name,
        municipality_code,
        municipality_name
    )
    .map(|(dc, dn, cn, mc, mn)| NameRow {
        department_code: dc.unwrap_or_default().to_string(),
        department_name: dn.unwrap_or_default().to_string(),
        constituency_name: cn.unwrap_or_default().to_string(),
        municipality_code: mc.unwrap_or_default().to_string(),
        municipality_name: mn.unwrap_or_default().to_string(),
    })
    .collect();
    Ok(rows)
}

pub(crate) fn records_from_df(df: &DataFrame) -> Result<Vec<VotingBureauRecord>> {
    let names = name_rows_from_df(df)?;
    let geometry = df.column(GEOMETRY)?.as_materialized_series().binary()?;
    let bureau_codes: Vec<Option<String>> = match df.column(BUREAU_CODE) {
        Ok(column) => column
            .str()?
            .into_iter()
            .map(|code| code.map(ToString::to_string))
            .collect(),
        Err(_) => vec![None; df.height()],
    };

    let records = izip!(names, bureau_codes, geometry)
        .map(|(row, bureau_code, wkb)| VotingBureauRecord {
            department_code: row.department_code,
            department_name: row.department_name,
            constituency_name: row.constituency_name,
            municipality_code: row.municipality_code,
            municipality_name: row.municipality_name,
            bureau_code,
            geometry: wkb.map(<[u8]>::to_vec).unwrap_or_default(),
        })
        .collect();
    Ok(records)
}

impl VotingBureauRecord {
    pub fn names(&self) -> NameRow {
        NameRow {
            department_code: self.department_code.clone(),
            department_name: self.department_name.clone(),
            constituency_name: self.constituency_name.clone(),
            municipality_code: self.municipality_code.clone(),
            municipality_name: self.municipality_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_df() -> DataFrame {
        df!(
            DEPARTMENT_CODE => &["54", "08"],
            DEPARTMENT_NAME => &["Meurthe-et-Moselle", "Ardennes"],
            CONSTITUENCY_NAME => &["1ère circonscription", "3ème circonscription"],
            MUNICIPALITY_CODE => &["54395", "08171"],
            MUNICIPALITY_NAME => &["Nancy", "Fléville"],
        )
        .unwrap()
    }

    #[test]
    fn test_validate_schema_reports_missing_geometry() {
        let df = names_df();
        let err = validate_schema(&df.schema()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(GEOMETRY)));
    }

    #[test]
    fn test_name_rows_from_df() {
        let rows = name_rows_from_df(&names_df()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].municipality_name, "Fléville");
        assert_eq!(rows[1].department_code, "08");
    }

    #[test]
    fn test_records_without_bureau_column() {
        let mut df = names_df();
        let wkbs: Vec<&[u8]> = vec![&[1u8, 2, 3], &[4u8]];
        df.with_column(Series::new(GEOMETRY.into(), wkbs)).unwrap();

        let records = records_from_df(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].geometry, vec![1, 2, 3]);
        assert!(records.iter().all(|r| r.bureau_code.is_none()));
        assert_eq!(records[0].names().municipality_code, "54395");
    }
}
