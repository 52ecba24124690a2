// src/kpi/stats.rs

use std::collections::BTreeMap;

use crate::unified::{UnifiedRecord, UnifiedTable};

/// Round half away from zero to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Running mean that skips missing values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    pub fn push(&mut self, v: Option<f64>) {
        if let Some(v) = v {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when every value seen was missing.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    /// Index of the first record of the group, in table order.
    pub first: usize,
    pub size: usize,
    /// One accumulator per indicator.
    pub means: Vec<MeanAcc>,
}

/// Group records by `key`, groups ordered by key, accumulating a mean per indicator.
pub fn group_by<K, F>(table: &UnifiedTable, key: F) -> BTreeMap<K, Group>
where
    K: Ord,
    F: Fn(&UnifiedRecord) -> K,
{
    let width = table.indicators().len();
    let mut groups: BTreeMap<K, Group> = BTreeMap::new();
    for (idx, rec) in table.records().iter().enumerate() {
        let group = groups.entry(key(rec)).or_insert_with(|| Group {
            first: idx,
            size: 0,
            means: vec![MeanAcc::default(); width],
        });
        group.size += 1;
        for (acc, v) in group.means.iter_mut().zip(&rec.values) {
            acc.push(*v);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(-1.005_1), -1.01);
        assert_eq!(round2(3.0), 3.0);
    }

    #[test]
    fn mean_skips_missing() {
        let mut acc = MeanAcc::default();
        assert_eq!(acc.mean(), None);
        acc.push(Some(1.0));
        acc.push(None);
        acc.push(Some(2.0));
        assert_eq!(acc.mean(), Some(1.5));
    }
}
