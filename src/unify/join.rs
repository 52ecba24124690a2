// src/unify/join.rs

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::frame::{KeyedRow, KeyedTable};
use crate::error::{PipelineError, Result};
use crate::indicator::RecordKey;

/// Full outer join of `right` onto `left` on the composite key.
///
/// - Output columns are `left` indicators followed by `right` indicators.
/// - Left rows keep their order; each is paired with every right row sharing its key
///   (many-to-many), or padded with missing values when none does.
/// - Right rows whose key never appears on the left follow, in right order, padded on the left.
/// - An indicator present on both sides is a configuration error, never an overwrite.
pub fn outer_join(left: KeyedTable, right: KeyedTable) -> Result<KeyedTable> {
    let (left_cols, left_rows) = left.into_parts();
    let (right_cols, right_rows) = right.into_parts();

    let seen: HashSet<&str> = left_cols.iter().map(String::as_str).collect();
    if let Some(dup) = right_cols.iter().find(|c| seen.contains(c.as_str())) {
        return Err(PipelineError::DuplicateIndicator(dup.clone()));
    }

    let left_width = left_cols.len();
    let right_width = right_cols.len();

    // key → positions in right_rows, in input order
    let mut index: HashMap<&RecordKey, Vec<usize>> = HashMap::with_capacity(right_rows.len());
    for (i, row) in right_rows.iter().enumerate() {
        index.entry(&row.key).or_default().push(i);
    }

    let mut matched = vec![false; right_rows.len()];
    let mut out = Vec::with_capacity(left_rows.len().max(right_rows.len()));

    for lrow in &left_rows {
        match index.get(&lrow.key) {
            Some(positions) => {
                for &i in positions {
                    matched[i] = true;
                    let mut values = Vec::with_capacity(left_width + right_width);
                    values.extend_from_slice(&lrow.values);
                    values.extend_from_slice(&right_rows[i].values);
                    out.push(KeyedRow {
                        key: lrow.key.clone(),
                        values,
                    });
                }
            }
            None => {
                let mut values = lrow.values.clone();
                values.resize(left_width + right_width, None);
                out.push(KeyedRow {
                    key: lrow.key.clone(),
                    values,
                });
            }
        }
    }

    let mut right_only = 0usize;
    for (i, rrow) in right_rows.iter().enumerate() {
        if matched[i] {
            continue;
        }
        right_only += 1;
        let mut values = vec![None; left_width];
        values.extend_from_slice(&rrow.values);
        out.push(KeyedRow {
            key: rrow.key.clone(),
            values,
        });
    }

    debug!(
        left = left_rows.len(),
        right = right_rows.len(),
        right_only,
        joined = out.len(),
        "outer join"
    );

    let mut columns = left_cols;
    columns.extend(right_cols);
    Ok(KeyedTable::new(columns, out))
}
