// src/kpi/rank.rs

use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

use crate::error::Result;
use crate::indicator::{AREA, COUNTRY_CODE, SEX};
use crate::unified::{UnifiedTable, COUNTRY_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Rank 1 is the highest value.
    HigherIsBetter,
    /// Rank 1 is the lowest value.
    LowerIsBetter,
}

/// Decides which way each indicator is ranked.
///
/// An entry in `directions` always wins. Otherwise an indicator whose name contains one of
/// `lower_is_better_keywords` (case-insensitive) ranks ascending, and anything else ranks
/// descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankingPolicy {
    pub lower_is_better_keywords: Vec<String>,
    pub directions: BTreeMap<String, Direction>,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            lower_is_better_keywords: ["poverty", "unemployment", "dropout", "gini"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            directions: BTreeMap::new(),
        }
    }
}

impl RankingPolicy {
    pub fn direction_for(&self, indicator: &str) -> Direction {
        if let Some(d) = self.directions.get(indicator) {
            return *d;
        }
        let lower = indicator.to_lowercase();
        if self
            .lower_is_better_keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
        {
            Direction::LowerIsBetter
        } else {
            Direction::HigherIsBetter
        }
    }
}

/// Standard competition ranking ("1224"): tied values share the best rank of their run and
/// the next distinct value skips ahead by the size of the tie. Missing values get no rank.
pub fn competition_rank(values: &[Option<f64>], direction: Direction) -> Vec<Option<i64>> {
    let mut order: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    order.sort_by(|a, b| match direction {
        Direction::LowerIsBetter => a.1.total_cmp(&b.1),
        Direction::HigherIsBetter => b.1.total_cmp(&a.1),
    });

    let mut ranks = vec![None; values.len()];
    let mut prev: Option<f64> = None;
    let mut current = 0i64;
    for (pos, &(i, v)) in order.iter().enumerate() {
        if prev != Some(v) {
            current = pos as i64 + 1;
            prev = Some(v);
        }
        ranks[i] = Some(current);
    }
    ranks
}

/// `rankings`: rows of the single latest year in the table, each indicator ranked once over
/// all of them.
///
/// Columns: `country_code, country_name, area, sex, <indicators…>, <indicator>_rank…`.
pub fn rankings(table: &UnifiedTable, policy: &RankingPolicy) -> Result<RecordBatch> {
    let records = table.records();
    let latest: Vec<usize> = match table.max_year() {
        Some(year) => (0..records.len())
            .filter(|&i| records[i].key.year == year)
            .collect(),
        None => Vec::new(),
    };
    debug!(year = ?table.max_year(), rows = latest.len(), "ranking latest year");

    let mut fields = vec![
        Field::new(COUNTRY_CODE, DataType::Utf8, false),
        Field::new(COUNTRY_NAME, DataType::Utf8, false),
        Field::new(AREA, DataType::Utf8, false),
        Field::new(SEX, DataType::Utf8, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            latest.iter().map(|&i| &records[i].key.country_code),
        )),
        Arc::new(StringArray::from_iter_values(
            latest.iter().map(|&i| &records[i].country_name),
        )),
        Arc::new(StringArray::from_iter_values(
            latest.iter().map(|&i| &records[i].key.area),
        )),
        Arc::new(StringArray::from_iter_values(
            latest.iter().map(|&i| &records[i].key.sex),
        )),
    ];

    let mut rank_fields = Vec::new();
    let mut rank_arrays: Vec<ArrayRef> = Vec::new();
    for (idx, name) in table.indicators().iter().enumerate() {
        let values: Vec<Option<f64>> = latest.iter().map(|&i| records[i].values[idx]).collect();
        let direction = policy.direction_for(name);

        let ranks = competition_rank(&values, direction);

        fields.push(Field::new(name, DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(values)));
        rank_fields.push(Field::new(format!("{}_rank", name), DataType::Int64, true));
        rank_arrays.push(Arc::new(Int64Array::from(ranks)));
    }
    fields.extend(rank_fields);
    arrays.extend(rank_arrays);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::RecordKey;
    use crate::unified::UnifiedRecord;
    use arrow::array::Array;

    #[test]
    fn keywords_pick_ascending_order() {
        let policy = RankingPolicy::default();
        assert_eq!(policy.direction_for("poverty_rate"), Direction::LowerIsBetter);
        assert_eq!(policy.direction_for("Gini_Index"), Direction::LowerIsBetter);
        assert_eq!(
            policy.direction_for("early_school_dropout_rate"),
            Direction::LowerIsBetter
        );
        assert_eq!(policy.direction_for("internet_access"), Direction::HigherIsBetter);
    }

    #[test]
    fn explicit_direction_overrides_keywords() {
        let mut policy = RankingPolicy::default();
        policy
            .directions
            .insert("unemployment_survey_id".into(), Direction::HigherIsBetter);
        assert_eq!(
            policy.direction_for("unemployment_survey_id"),
            Direction::HigherIsBetter
        );
        assert_eq!(policy.direction_for("unemployment_rate"), Direction::LowerIsBetter);
    }

    #[test]
    fn ties_share_rank_and_next_skips() {
        let values = [Some(5.0), Some(9.0), Some(5.0), None, Some(1.0)];
        assert_eq!(
            competition_rank(&values, Direction::HigherIsBetter),
            vec![Some(2), Some(1), Some(2), None, Some(4)]
        );
        assert_eq!(
            competition_rank(&values, Direction::LowerIsBetter),
            vec![Some(2), Some(4), Some(2), None, Some(1)]
        );
    }

    fn rec(year: i32, code: &str, sex: &str, poverty: f64, internet: f64) -> UnifiedRecord {
        UnifiedRecord {
            key: RecordKey::new(year, code, "total", sex),
            country_name: code.to_string(),
            values: vec![Some(poverty), Some(internet)],
        }
    }

    fn ranks(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .iter()
            .collect()
    }

    #[test]
    fn only_the_latest_year_is_ranked() {
        let table = UnifiedTable::new(
            vec!["poverty_rate".into(), "internet_access".into()],
            vec![
                rec(2021, "ARG", "total", 1.0, 99.0),
                rec(2022, "ARG", "total", 20.0, 60.0),
                rec(2022, "BOL", "total", 35.0, 40.0),
                rec(2022, "CHL", "total", 12.0, 80.0),
            ],
        );
        let batch = rankings(&table, &RankingPolicy::default()).unwrap();
        assert_eq!(batch.num_rows(), 3);

        // lower poverty is better: CHL (12) first
        assert_eq!(ranks(&batch, "poverty_rate_rank"), vec![Some(2), Some(3), Some(1)]);
        // higher internet access is better: CHL (80) first
        assert_eq!(ranks(&batch, "internet_access_rank"), vec![Some(2), Some(3), Some(1)]);

        let names: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "country_code",
                "country_name",
                "area",
                "sex",
                "poverty_rate",
                "internet_access",
                "poverty_rate_rank",
                "internet_access_rank"
            ]
        );
    }

    #[test]
    fn mixed_sex_rows_share_one_ranking() {
        let table = UnifiedTable::new(
            vec!["poverty_rate".into(), "internet_access".into()],
            vec![
                rec(2022, "ARG", "female", 20.0, 60.0),
                rec(2022, "ARG", "male", 25.0, 61.0),
                rec(2022, "BOL", "female", 30.0, 40.0),
                rec(2022, "BOL", "male", 10.0, 41.0),
            ],
        );
        let batch = rankings(&table, &RankingPolicy::default()).unwrap();
        assert_eq!(batch.num_rows(), 4);
        assert_eq!(ranks(&batch, "poverty_rate_rank"), vec![Some(2), Some(3), Some(4), Some(1)]);
        for col in ["poverty_rate_rank", "internet_access_rank"] {
            let ones = ranks(&batch, col).into_iter().filter(|r| *r == Some(1)).count();
            assert_eq!(ones, 1, "{}", col);
        }
    }

    #[test]
    fn empty_table_gives_empty_rankings() {
        let table = UnifiedTable::new(vec!["gini".into()], Vec::new());
        let batch = rankings(&table, &RankingPolicy::default()).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 6);
        assert_eq!(batch.column(5).null_count(), 0);
    }
}
