// src/unified/arrow.rs

use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::{UnifiedRecord, UnifiedTable};
use crate::columns::{measure_values, text_values, year_values};
use crate::error::{PipelineError, Result};
use crate::indicator::{RecordKey, AREA, COUNTRY_CODE, KEY_COLUMNS, SEX, YEAR};

pub const COUNTRY_NAME: &str = "country_name";

/// Name the unified artifact is persisted under.
pub const UNIFIED_ARTIFACT: &str = "unified_data";

/// `year, country_code, area, sex, country_name, <indicators…>`
pub fn unified_schema(indicators: &[String]) -> Schema {
    let mut fields = vec![
        Field::new(YEAR, DataType::Int32, false),
        Field::new(COUNTRY_CODE, DataType::Utf8, false),
        Field::new(AREA, DataType::Utf8, false),
        Field::new(SEX, DataType::Utf8, false),
        Field::new(COUNTRY_NAME, DataType::Utf8, false),
    ];
    fields.extend(
        indicators
            .iter()
            .map(|name| Field::new(name, DataType::Float64, true)),
    );
    Schema::new(fields)
}

impl UnifiedTable {
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let recs = &self.records;
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from_iter_values(recs.iter().map(|r| r.key.year))),
            Arc::new(StringArray::from_iter_values(
                recs.iter().map(|r| r.key.country_code.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(recs.iter().map(|r| r.key.area.as_str()))),
            Arc::new(StringArray::from_iter_values(recs.iter().map(|r| r.key.sex.as_str()))),
            Arc::new(StringArray::from_iter_values(
                recs.iter().map(|r| r.country_name.as_str()),
            )),
        ];
        for idx in 0..self.indicators.len() {
            columns.push(Arc::new(Float64Array::from(self.column(idx))));
        }

        let batch = RecordBatch::try_new(Arc::new(unified_schema(&self.indicators)), columns)?;
        Ok(batch)
    }

    /// Rebuild from a persisted batch (typed or all-Utf8). Every column that is not a key
    /// column or `country_name` is read as an indicator.
    pub fn try_from_batch(batch: &RecordBatch) -> Result<Self> {
        Self::try_from_batches(std::slice::from_ref(batch))
    }

    pub fn try_from_batches(batches: &[RecordBatch]) -> Result<Self> {
        let table = UNIFIED_ARTIFACT;
        let Some(first) = batches.first() else {
            return Ok(Self::default());
        };

        let schema = first.schema();
        for col in KEY_COLUMNS.iter().chain(std::iter::once(&COUNTRY_NAME)) {
            if schema.index_of(col).is_err() {
                return Err(PipelineError::schema(
                    table,
                    format!("missing required column `{}`", col),
                ));
            }
        }
        let indicators: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .filter(|n| !KEY_COLUMNS.contains(&n.as_str()) && n != COUNTRY_NAME)
            .collect();

        let mut records = Vec::new();
        for batch in batches {
            // errors count rows across batches
            let first_row = records.len();
            let years = year_values(batch, table, YEAR, first_row)?;
            let codes = text_values(batch, table, COUNTRY_CODE, first_row)?;
            let areas = text_values(batch, table, AREA, first_row)?;
            let sexes = text_values(batch, table, SEX, first_row)?;
            let names = text_values(batch, table, COUNTRY_NAME, first_row)?;
            let columns = indicators
                .iter()
                .map(|ind| measure_values(batch, table, ind, first_row))
                .collect::<Result<Vec<_>>>()?;

            for row in 0..batch.num_rows() {
                records.push(UnifiedRecord {
                    key: RecordKey {
                        year: years[row],
                        country_code: codes[row].clone(),
                        area: areas[row].clone(),
                        sex: sexes[row].clone(),
                    },
                    country_name: names[row].clone(),
                    values: columns.iter().map(|c| c[row]).collect(),
                });
            }
        }

        Ok(Self::new(indicators, records))
    }
}
