// src/unified/mod.rs

pub mod arrow;

use crate::indicator::RecordKey;

pub use self::arrow::{unified_schema, COUNTRY_NAME, UNIFIED_ARTIFACT};

/// One fully reconciled (country_code, year, area, sex) row.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRecord {
    pub key: RecordKey,
    pub country_name: String,
    /// Parallel to [`UnifiedTable::indicators`].
    pub values: Vec<Option<f64>>,
}

/// The wide fact table: key columns, `country_name`, one numeric column per indicator.
/// Immutable once built; the KPI engine and the writers only read it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedTable {
    indicators: Vec<String>,
    records: Vec<UnifiedRecord>,
}

impl UnifiedTable {
    pub fn new(indicators: Vec<String>, records: Vec<UnifiedRecord>) -> Self {
        debug_assert!(records.iter().all(|r| r.values.len() == indicators.len()));
        Self {
            indicators,
            records,
        }
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn records(&self) -> &[UnifiedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn indicator_index(&self, name: &str) -> Option<usize> {
        self.indicators.iter().position(|i| i == name)
    }

    /// Values of one indicator column, row-aligned with [`UnifiedTable::records`].
    pub fn column(&self, idx: usize) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.values[idx]).collect()
    }

    /// Latest year present anywhere in the table.
    pub fn max_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.key.year).max()
    }
}
