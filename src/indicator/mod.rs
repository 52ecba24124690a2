// src/indicator/mod.rs

pub mod read;

use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::columns::{measure_values, text_values, year_values};
use crate::error::{PipelineError, Result};

pub use read::{discover_indicator_files, read_indicator_csv, read_indicator_dir};

pub const YEAR: &str = "year";
pub const COUNTRY_CODE: &str = "country_code";
pub const AREA: &str = "area";
pub const SEX: &str = "sex";
pub const VALUE: &str = "value";

/// The composite natural key every indicator source is keyed on.
pub const KEY_COLUMNS: [&str; 4] = [YEAR, COUNTRY_CODE, AREA, SEX];

static NON_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex is valid"));

/// (year, country_code, area, sex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey {
    pub year: i32,
    pub country_code: String,
    pub area: String,
    pub sex: String,
}

impl RecordKey {
    pub fn new(year: i32, country_code: &str, area: &str, sex: &str) -> Self {
        Self {
            year,
            country_code: country_code.to_string(),
            area: area.to_string(),
            sex: sex.to_string(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.year, self.country_code, self.area, self.sex)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub key: RecordKey,
    /// `None` when the source left the cell empty.
    pub value: Option<f64>,
}

/// One raw indicator source, already validated and carrying its own column name.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    name: String,
    rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    /// Build from rows already in memory. `name` is normalized the same way file stems are.
    pub fn new(name: &str, rows: Vec<IndicatorRow>) -> Result<Self> {
        Ok(Self {
            name: indicator_name(name)?,
            rows,
        })
    }

    /// Validate `batch` against the indicator contract and pull out its rows.
    ///
    /// Key columns must all be present and non-empty, `year` must be a 4-digit integer and
    /// `value` must be numeric (blank/NaN cells become missing). Extra columns are ignored.
    pub fn try_from_batch(name: &str, batch: &RecordBatch) -> Result<Self> {
        Self::try_from_batches(name, std::slice::from_ref(batch))
    }

    /// Concatenate several batches of the same source (the CSV reader yields batches).
    /// Row numbers in errors count across all of them.
    pub fn try_from_batches(name: &str, batches: &[RecordBatch]) -> Result<Self> {
        let mut table = Self::new(name, Vec::new())?;
        let mut first_row = 0;
        for batch in batches {
            let rows = rows_from_batch(&table.name, batch, first_row)?;
            first_row += batch.num_rows();
            table.rows.extend(rows);
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<IndicatorRow>) {
        (self.name, self.rows)
    }
}

/// Validate one batch of an indicator source and pull out its rows. `first_row` is the
/// batch's offset within the source.
fn rows_from_batch(
    name: &str,
    batch: &RecordBatch,
    first_row: usize,
) -> Result<Vec<IndicatorRow>> {
    // required columns first, before any cell is parsed
    let schema = batch.schema();
    for col in KEY_COLUMNS.iter().chain(std::iter::once(&VALUE)) {
        if schema.index_of(col).is_err() {
            return Err(PipelineError::schema(
                name,
                format!("missing required column `{}`", col),
            ));
        }
    }

    let years = year_values(batch, name, YEAR, first_row)?;
    let codes = text_values(batch, name, COUNTRY_CODE, first_row)?;
    let areas = text_values(batch, name, AREA, first_row)?;
    let sexes = text_values(batch, name, SEX, first_row)?;
    let values = measure_values(batch, name, VALUE, first_row)?;

    let rows = years
        .into_iter()
        .zip(codes)
        .zip(areas)
        .zip(sexes)
        .zip(values)
        .map(|((((year, country_code), area), sex), value)| IndicatorRow {
            key: RecordKey {
                year,
                country_code,
                area,
                sex,
            },
            value,
        })
        .collect();
    Ok(rows)
}

/// Normalize an identifying name ("Poverty Rate", "poverty-rate.v2") into a column name:
/// lowercase, runs of anything outside `[a-z0-9]` collapsed to `_`, no leading/trailing `_`.
pub fn indicator_name(raw: &str) -> Result<String> {
    let lower = raw.trim().to_lowercase();
    let name = NON_IDENT.replace_all(&lower, "_").trim_matches('_').to_string();
    if name.is_empty() {
        return Err(PipelineError::schema(
            raw,
            "cannot derive an indicator name from this identifier",
        ));
    }
    if KEY_COLUMNS.contains(&name.as_str()) || name == "country_name" {
        return Err(PipelineError::schema(
            raw,
            format!("indicator name `{}` collides with a reserved column", name),
        ));
    }
    Ok(name)
}
