// src/columns.rs
//
// Column extraction helpers shared by the indicator and unified readers. Inputs arrive either
// as all-Utf8 batches straight off the CSV reader or as typed batches built in memory, so every
// helper accepts both.

use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};

use crate::error::{PipelineError, Result};

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Look up `name` in `batch`, failing with a schema error that names the table.
pub fn require_column<'a>(batch: &'a RecordBatch, table: &str, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| PipelineError::schema(table, format!("missing required column `{}`", name)))?;
    Ok(batch.column(idx))
}

fn as_strings(arr: &ArrayRef, table: &str, name: &str) -> Result<StringArray> {
    let utf8 = cast(arr, &DataType::Utf8).map_err(|e| {
        PipelineError::schema(
            table,
            format!("column `{}` ({}) cannot be read as text: {}", name, arr.data_type(), e),
        )
    })?;
    let sarr = utf8
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::schema(table, format!("column `{}` is not Utf8", name)))?;
    Ok(sarr.clone())
}

/// Non-empty categorical values (keys, names). Null or blank cells are errors.
///
/// `first_row` is the position of the batch's first row within its table, so errors point at
/// the row of the whole input rather than of one reader batch.
pub fn text_values(
    batch: &RecordBatch,
    table: &str,
    name: &str,
    first_row: usize,
) -> Result<Vec<String>> {
    let arr = require_column(batch, table, name)?;
    let sarr = as_strings(arr, table, name)?;

    let mut out = Vec::with_capacity(sarr.len());
    for (row, opt) in sarr.iter().enumerate() {
        let cleaned = opt.map(clean_str).unwrap_or_default();
        if cleaned.is_empty() {
            return Err(PipelineError::invalid_cell(
                table,
                first_row + row,
                name,
                "missing value",
            ));
        }
        out.push(cleaned);
    }
    Ok(out)
}

/// Four-digit years. Accepts integer columns, integral floats ("2022.0") and text.
pub fn year_values(
    batch: &RecordBatch,
    table: &str,
    name: &str,
    first_row: usize,
) -> Result<Vec<i32>> {
    let raw = text_values(batch, table, name, first_row)?;

    raw.iter()
        .enumerate()
        .map(|(row, s)| {
            let year = s.parse::<i32>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i32::MAX as f64)
                    .map(|f| f as i32)
            });
            match year {
                Some(y) if (1000..=9999).contains(&y) => Ok(y),
                Some(y) => Err(PipelineError::invalid_cell(
                    table,
                    first_row + row,
                    name,
                    &format!("{} is not a 4-digit year", y),
                )),
                None => Err(PipelineError::invalid_cell(
                    table,
                    first_row + row,
                    name,
                    &format!("`{}` is not an integer year", s),
                )),
            }
        })
        .collect()
}

/// Measured values. Null, blank and NaN cells are missing; anything else must parse.
pub fn measure_values(
    batch: &RecordBatch,
    table: &str,
    name: &str,
    first_row: usize,
) -> Result<Vec<Option<f64>>> {
    let arr = require_column(batch, table, name)?;

    match arr.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let sarr = as_strings(arr, table, name)?;
            sarr.iter()
                .enumerate()
                .map(|(row, opt)| {
                    let cleaned = opt.map(clean_str).unwrap_or_default();
                    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
                        return Ok(None);
                    }
                    cleaned
                        .parse::<f64>()
                        .map(|v| Some(v).filter(|v| v.is_finite()))
                        .map_err(|_| {
                            PipelineError::invalid_cell(
                                table,
                                first_row + row,
                                name,
                                &format!("`{}` is not a number", cleaned),
                            )
                        })
                })
                .collect()
        }
        dt if dt.is_numeric() => {
            let floats = cast(arr, &DataType::Float64)?;
            let farr = floats
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    PipelineError::schema(table, format!("column `{}` is not Float64", name))
                })?;
            Ok(farr.iter().map(|v| v.filter(|v| v.is_finite())).collect())
        }
        other => Err(PipelineError::schema(
            table,
            format!("column `{}` has non-numeric type {}", name, other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{Int64Array, StringArray},
        datatypes::{Field, Schema},
    };
    use std::sync::Arc;

    fn text_batch(cols: &[(&str, Vec<Option<&str>>)]) -> RecordBatch {
        let fields: Vec<Field> = cols
            .iter()
            .map(|(n, _)| Field::new(*n, DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = cols
            .iter()
            .map(|(_, v)| Arc::new(StringArray::from(v.clone())) as ArrayRef)
            .collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    #[test]
    fn clean_str_strips_quotes_and_whitespace() {
        assert_eq!(clean_str("  \" total \" "), "total");
        assert_eq!(clean_str("ARG"), "ARG");
        assert_eq!(clean_str("\""), "\"");
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let batch = text_batch(&[("year", vec![Some("2022")])]);
        let err = text_values(&batch, "poverty", "sex", 0).unwrap_err();
        match err {
            PipelineError::Schema { table, reason } => {
                assert_eq!(table, "poverty");
                assert!(reason.contains("`sex`"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn years_parse_from_text_and_integral_floats() {
        let batch = text_batch(&[("year", vec![Some("2022"), Some(" 2019.0 ")])]);
        assert_eq!(year_values(&batch, "t", "year", 0).unwrap(), vec![2022, 2019]);

        let bad = text_batch(&[("year", vec![Some("2022"), Some("22")])]);
        let err = year_values(&bad, "t", "year", 0).unwrap_err().to_string();
        assert!(err.contains("row 2"), "{}", err);
    }

    #[test]
    fn years_accept_integer_columns() {
        let schema = Schema::new(vec![Field::new("year", DataType::Int64, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Int64Array::from(vec![2020, 2021])) as ArrayRef],
        )
        .unwrap();
        assert_eq!(year_values(&batch, "t", "year", 0).unwrap(), vec![2020, 2021]);
    }

    #[test]
    fn measures_treat_blank_and_nan_as_missing() {
        let batch = text_batch(&[(
            "value",
            vec![Some("1.5"), None, Some(""), Some("NaN"), Some("-3")],
        )]);
        assert_eq!(
            measure_values(&batch, "t", "value", 0).unwrap(),
            vec![Some(1.5), None, None, None, Some(-3.0)]
        );
    }

    #[test]
    fn unparsable_measure_names_the_cell() {
        let batch = text_batch(&[("value", vec![Some("1.5"), Some("n/a")])]);
        let err = measure_values(&batch, "gini", "value", 0).unwrap_err().to_string();
        assert!(err.contains("gini") && err.contains("row 2") && err.contains("`value`"));
    }

    #[test]
    fn cell_errors_count_from_the_batch_offset() {
        let batch = text_batch(&[("value", vec![Some("1"), Some("oops")])]);
        let err = measure_values(&batch, "gini", "value", 8_192).unwrap_err().to_string();
        assert!(err.contains("row 8194"), "{}", err);
    }

    #[test]
    fn blank_key_cell_is_rejected() {
        let batch = text_batch(&[("area", vec![Some("urban"), Some("  ")])]);
        assert!(matches!(
            text_values(&batch, "t", "area", 0),
            Err(PipelineError::Schema { .. })
        ));
    }
}
