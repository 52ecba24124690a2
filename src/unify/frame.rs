// src/unify/frame.rs

use crate::indicator::{IndicatorTable, RecordKey};
use crate::unified::UnifiedTable;

#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRow {
    pub key: RecordKey,
    /// One slot per indicator column of the owning table, in column order.
    pub values: Vec<Option<f64>>,
}

impl KeyedRow {
    pub fn present(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Key columns plus N named indicator columns. This is the accumulator of the unify fold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedTable {
    indicators: Vec<String>,
    rows: Vec<KeyedRow>,
}

impl KeyedTable {
    pub fn new(indicators: Vec<String>, rows: Vec<KeyedRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == indicators.len()));
        Self { indicators, rows }
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn rows(&self) -> &[KeyedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<KeyedRow>) {
        (self.indicators, self.rows)
    }
}

/// The rename step: the single `value` column becomes a column named after the indicator.
impl From<IndicatorTable> for KeyedTable {
    fn from(table: IndicatorTable) -> Self {
        let (name, rows) = table.into_parts();
        let rows = rows
            .into_iter()
            .map(|r| KeyedRow {
                key: r.key,
                values: vec![r.value],
            })
            .collect();
        KeyedTable::new(vec![name], rows)
    }
}

/// Lets an already unified table be fed back into the unifier as a single input.
impl From<&UnifiedTable> for KeyedTable {
    fn from(table: &UnifiedTable) -> Self {
        let rows = table
            .records()
            .iter()
            .map(|r| KeyedRow {
                key: r.key.clone(),
                values: r.values.clone(),
            })
            .collect();
        KeyedTable::new(table.indicators().to_vec(), rows)
    }
}
