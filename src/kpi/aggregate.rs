// src/kpi/aggregate.rs
//
// Grouped means: per country and per year. Plus the pass-through matrix view.

use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::stats::{group_by, round2, Group};
use crate::error::Result;
use crate::indicator::{COUNTRY_CODE, YEAR};
use crate::unified::{UnifiedTable, COUNTRY_NAME};

/// Indicator columns holding rounded group means, one array per indicator.
fn mean_columns<'a>(
    table: &UnifiedTable,
    groups: impl Iterator<Item = &'a Group> + Clone,
) -> (Vec<Field>, Vec<ArrayRef>) {
    let mut fields = Vec::with_capacity(table.indicators().len());
    let mut arrays = Vec::with_capacity(table.indicators().len());
    for (idx, name) in table.indicators().iter().enumerate() {
        let means: Float64Array = groups
            .clone()
            .map(|g| g.means[idx].mean().map(round2))
            .collect();
        fields.push(Field::new(name, DataType::Float64, true));
        arrays.push(Arc::new(means) as ArrayRef);
    }
    (fields, arrays)
}

/// `promedios_pais`: one row per country_code (ascending), first country_name, means.
pub fn promedios_pais(table: &UnifiedTable) -> Result<RecordBatch> {
    let groups = group_by(table, |r| r.key.country_code.clone());
    let records = table.records();

    let codes = StringArray::from_iter_values(groups.keys());
    let names =
        StringArray::from_iter_values(groups.values().map(|g| &records[g.first].country_name));

    let mut fields = vec![
        Field::new(COUNTRY_CODE, DataType::Utf8, false),
        Field::new(COUNTRY_NAME, DataType::Utf8, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(codes), Arc::new(names)];
    let (mfields, marrays) = mean_columns(table, groups.values());
    fields.extend(mfields);
    arrays.extend(marrays);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// `evolucion_temporal`: one row per year (ascending), means across every row of the year.
pub fn evolucion_temporal(table: &UnifiedTable) -> Result<RecordBatch> {
    let groups = group_by(table, |r| r.key.year);

    let mut fields = vec![Field::new(YEAR, DataType::Int32, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(Int32Array::from_iter_values(
        groups.keys().copied(),
    ))];
    let (mfields, marrays) = mean_columns(table, groups.values());
    fields.extend(mfields);
    arrays.extend(marrays);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// `pais_año`: the unified table as is.
pub fn pais_anio(table: &UnifiedTable) -> Result<RecordBatch> {
    table.to_record_batch()
}
