// src/unify/mod.rs

pub mod frame;
pub mod join;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::indicator::IndicatorTable;

pub use frame::{KeyedRow, KeyedTable};
pub use join::outer_join;

/// Which partially covered rows survive the merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletenessPolicy {
    /// Every indicator must be present.
    All,
    /// At least this share (0.0..=1.0) of the indicators must be present.
    Threshold(f64),
}

impl Default for CompletenessPolicy {
    fn default() -> Self {
        CompletenessPolicy::All
    }
}

impl CompletenessPolicy {
    /// `1.0` (or more) means `All`; anything lower is a threshold.
    pub fn from_min_coverage(min_coverage: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_coverage) {
            return Err(PipelineError::InvalidConfig(format!(
                "completeness min_coverage must be within [0, 1], got {}",
                min_coverage
            )));
        }
        Ok(if min_coverage >= 1.0 {
            CompletenessPolicy::All
        } else {
            CompletenessPolicy::Threshold(min_coverage)
        })
    }

    pub fn retains(&self, row: &KeyedRow) -> bool {
        let width = row.values.len();
        match *self {
            CompletenessPolicy::All => row.present() == width,
            CompletenessPolicy::Threshold(min) => {
                width == 0 || row.present() as f64 / width as f64 >= min
            }
        }
    }
}

/// Row accounting for one unify call: `joined_rows = kept + dropped_incomplete + dropped_duplicates`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifyStats {
    pub inputs: usize,
    pub joined_rows: usize,
    pub dropped_incomplete: usize,
    pub dropped_duplicates: usize,
}

#[derive(Debug, Clone)]
pub struct UnifyOutcome {
    pub table: KeyedTable,
    pub stats: UnifyStats,
}

/// Merges indicator tables into one wide table on (year, country_code, area, sex).
#[derive(Debug, Clone, Default)]
pub struct Unifier {
    policy: CompletenessPolicy,
}

impl Unifier {
    pub fn new(policy: CompletenessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CompletenessPolicy {
        self.policy
    }

    /// Rename, fold-join, filter by completeness, dedup.
    #[tracing::instrument(level = "info", skip_all, fields(inputs = tables.len()))]
    pub fn unify(&self, tables: Vec<IndicatorTable>) -> Result<UnifyOutcome> {
        let frames = tables.into_iter().map(KeyedTable::from).collect();
        self.unify_frames(frames)
    }

    /// Same as [`Unifier::unify`] but over tables that may already hold several indicators,
    /// e.g. a previously unified table.
    pub fn unify_frames(&self, frames: Vec<KeyedTable>) -> Result<UnifyOutcome> {
        let inputs = frames.len();
        let mut frames = frames.into_iter();
        let first = frames.next().ok_or(PipelineError::EmptyInput)?;

        // 1) progressive outer join; a single input skips straight through
        let joined = frames.try_fold(first, outer_join)?;
        let joined_rows = joined.len();
        info!(
            rows = joined_rows,
            indicators = joined.indicators().len(),
            "tables joined"
        );

        // 2) completeness filter
        let (indicators, rows) = joined.into_parts();
        let before = rows.len();
        let complete: Vec<KeyedRow> = rows.into_iter().filter(|r| self.policy.retains(r)).collect();
        let dropped_incomplete = before - complete.len();
        if dropped_incomplete > 0 {
            warn!(
                dropped = dropped_incomplete,
                policy = ?self.policy,
                "dropped rows with missing indicator values"
            );
        }

        // 3) dedup on the key, first occurrence wins
        let before = complete.len();
        let mut seen = HashSet::with_capacity(before);
        let deduped: Vec<KeyedRow> = complete
            .into_iter()
            .filter(|r| seen.insert(r.key.clone()))
            .collect();
        let dropped_duplicates = before - deduped.len();
        info!(
            kept = deduped.len(),
            dropped_duplicates, "unified table ready"
        );

        Ok(UnifyOutcome {
            table: KeyedTable::new(indicators, deduped),
            stats: UnifyStats {
                inputs,
                joined_rows,
                dropped_incomplete,
                dropped_duplicates,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::{IndicatorRow, RecordKey};

    fn indicator(name: &str, rows: &[(i32, &str, Option<f64>)]) -> IndicatorTable {
        IndicatorTable::new(
            name,
            rows.iter()
                .map(|(y, c, v)| IndicatorRow {
                    key: RecordKey::new(*y, c, "total", "total"),
                    value: *v,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn zero_tables_is_empty_input() {
        let err = Unifier::default().unify(Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
    }

    #[test]
    fn three_single_value_tables_make_one_row() {
        let tables = vec![
            indicator("poverty_rate", &[(2022, "ARG", Some(10.0))]),
            indicator("dropout_rate", &[(2022, "ARG", Some(20.0))]),
            indicator("internet_access", &[(2022, "ARG", Some(30.0))]),
        ];
        let out = Unifier::default().unify(tables).unwrap();

        assert_eq!(
            out.table.indicators(),
            &["poverty_rate", "dropout_rate", "internet_access"]
        );
        assert_eq!(out.table.len(), 1);
        assert_eq!(
            out.table.rows()[0].values,
            vec![Some(10.0), Some(20.0), Some(30.0)]
        );
        assert_eq!(out.stats.dropped_incomplete, 0);
    }

    #[test]
    fn partially_covered_key_is_dropped_and_counted() {
        let tables = vec![
            indicator("a", &[(2022, "ARG", Some(1.0)), (2022, "BOL", Some(2.0))]),
            indicator("b", &[(2022, "ARG", Some(3.0)), (2022, "BOL", Some(4.0))]),
            indicator("c", &[(2022, "ARG", Some(5.0))]),
        ];
        let out = Unifier::default().unify(tables).unwrap();

        assert!(out.table.rows().iter().all(|r| r.key.country_code != "BOL"));
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.stats.joined_rows, 2);
        assert_eq!(out.stats.dropped_incomplete, 1);
        assert_eq!(out.stats.dropped_duplicates, 0);
    }

    #[test]
    fn missing_cell_in_source_counts_as_missing() {
        let tables = vec![
            indicator("a", &[(2022, "ARG", Some(1.0)), (2022, "BOL", None)]),
            indicator("b", &[(2022, "ARG", Some(3.0)), (2022, "BOL", Some(4.0))]),
        ];
        let out = Unifier::default().unify(tables).unwrap();
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.stats.dropped_incomplete, 1);
    }

    #[test]
    fn duplicate_keys_collapse_to_first() {
        let tables = vec![indicator(
            "a",
            &[(2022, "ARG", Some(1.0)), (2022, "ARG", Some(9.0))],
        )];
        let out = Unifier::default().unify(tables).unwrap();
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.rows()[0].values, vec![Some(1.0)]);
        assert_eq!(out.stats.dropped_duplicates, 1);
    }

    #[test]
    fn duplicates_across_a_join_still_yield_one_row_per_key() {
        let tables = vec![
            indicator("a", &[(2022, "ARG", Some(1.0)), (2022, "ARG", Some(2.0))]),
            indicator("b", &[(2022, "ARG", Some(10.0)), (2022, "ARG", Some(20.0))]),
        ];
        let out = Unifier::default().unify(tables).unwrap();
        assert_eq!(out.stats.joined_rows, 4);
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.rows()[0].values, vec![Some(1.0), Some(10.0)]);
        assert_eq!(
            out.stats.joined_rows,
            out.table.len() + out.stats.dropped_incomplete + out.stats.dropped_duplicates
        );
    }

    #[test]
    fn threshold_keeps_partial_rows() {
        let tables = vec![
            indicator("a", &[(2022, "ARG", Some(1.0)), (2022, "BOL", Some(2.0))]),
            indicator("b", &[(2022, "ARG", Some(3.0))]),
        ];
        let policy = CompletenessPolicy::from_min_coverage(0.5).unwrap();
        let out = Unifier::new(policy).unify(tables).unwrap();
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.table.rows()[1].values, vec![Some(2.0), None]);
    }

    #[test]
    fn coverage_bounds_are_checked() {
        assert_eq!(
            CompletenessPolicy::from_min_coverage(1.0).unwrap(),
            CompletenessPolicy::All
        );
        assert!(CompletenessPolicy::from_min_coverage(1.5).is_err());
        assert!(CompletenessPolicy::from_min_coverage(-0.1).is_err());
    }

    #[test]
    fn re_unifying_a_unified_table_is_a_no_op() {
        let tables = vec![
            indicator(
                "poverty_rate",
                &[(2021, "ARG", Some(1.0)), (2022, "ARG", Some(2.0)), (2022, "BOL", Some(3.0))],
            ),
            indicator("gini", &[(2021, "ARG", Some(0.4)), (2022, "ARG", Some(0.5))]),
        ];
        let once = Unifier::default().unify(tables).unwrap();
        let unified = crate::enrich::Enricher::new(Default::default())
            .enrich(once.table.clone())
            .unwrap();

        let twice = Unifier::default()
            .unify_frames(vec![KeyedTable::from(&unified)])
            .unwrap();
        assert_eq!(twice.table, once.table);
        assert_eq!(twice.stats.dropped_incomplete, 0);
        assert_eq!(twice.stats.dropped_duplicates, 0);
    }

    #[test]
    fn colliding_indicator_names_fail_fast() {
        let tables = vec![
            indicator("Poverty Rate", &[(2022, "ARG", Some(1.0))]),
            indicator("poverty-rate", &[(2022, "ARG", Some(2.0))]),
        ];
        assert!(matches!(
            Unifier::default().unify(tables),
            Err(PipelineError::DuplicateIndicator(_))
        ));
    }
}
