// src/kpi/regional.rs

use arrow::{
    array::{ArrayRef, Float64Array},
    datatypes::{DataType, Field, FieldRef, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::stats::{group_by, round2};
use crate::error::Result;
use crate::unified::UnifiedTable;

/// `comparacion_regional`: every unified row, plus per indicator the mean of that indicator
/// over all rows of the same year (`_regional_avg`) and the row's distance from it
/// (`_vs_regional`). The delta is taken against the unrounded mean, then rounded.
pub fn comparacion_regional(table: &UnifiedTable) -> Result<RecordBatch> {
    let base = table.to_record_batch()?;
    let mut fields: Vec<FieldRef> = base.schema().fields().iter().cloned().collect();
    let mut arrays: Vec<ArrayRef> = base.columns().to_vec();

    let by_year = group_by(table, |r| r.key.year);

    for (idx, name) in table.indicators().iter().enumerate() {
        let mut avg = Vec::with_capacity(table.len());
        let mut delta = Vec::with_capacity(table.len());
        for rec in table.records() {
            let mean = by_year
                .get(&rec.key.year)
                .and_then(|g| g.means[idx].mean());
            avg.push(mean.map(round2));
            delta.push(match (rec.values[idx], mean) {
                (Some(v), Some(m)) => Some(round2(v - m)),
                _ => None,
            });
        }

        fields.push(Arc::new(Field::new(
            format!("{}_regional_avg", name),
            DataType::Float64,
            true,
        )));
        arrays.push(Arc::new(Float64Array::from(avg)));
        fields.push(Arc::new(Field::new(
            format!("{}_vs_regional", name),
            DataType::Float64,
            true,
        )));
        arrays.push(Arc::new(Float64Array::from(delta)));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
