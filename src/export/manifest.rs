// src/export/manifest.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, io::Write, path::Path, path::PathBuf};

use super::write::write_atomic;
use crate::unify::UnifyStats;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub rows: usize,
    pub columns: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// What one stage wrote into its output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: String,
    pub tables: BTreeMap<String, TableEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unify: Option<UnifyStats>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            tables: BTreeMap::new(),
            unify: None,
        }
    }

    pub fn with_unify_stats(mut self, stats: UnifyStats) -> Self {
        self.unify = Some(stats);
        self
    }

    pub fn record(&mut self, table_name: &str, batch: &RecordBatch, files: Vec<PathBuf>) {
        let columns = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        self.tables.insert(
            table_name.to_string(),
            TableEntry {
                rows: batch.num_rows(),
                columns,
                files,
            },
        );
    }

    /// Pretty JSON with a trailing newline at `<dir>/manifest.json`, written atomically.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        write_atomic(&path, |file| {
            serde_json::to_writer_pretty(&mut *file, self).context("serializing manifest")?;
            file.write_all(b"\n")?;
            Ok(())
        })?;
        Ok(path)
    }

    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let f = std::fs::File::open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        serde_json::from_reader(f).with_context(|| format!("parsing {}", path.display()))
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::Int32Array,
        datatypes::{DataType, Field, Schema},
    };
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn manifest_round_trips_through_disk() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("year", DataType::Int32, false)])),
            vec![Arc::new(Int32Array::from(vec![2020, 2021, 2022]))],
        )?;

        let mut manifest = Manifest::new().with_unify_stats(UnifyStats {
            inputs: 2,
            joined_rows: 5,
            dropped_incomplete: 1,
            dropped_duplicates: 1,
        });
        manifest.record("unified_data", &batch, vec![dir.path().join("unified_data.csv")]);
        manifest.write(dir.path())?;

        let back = Manifest::read(dir.path())?;
        assert_eq!(back, manifest);
        assert_eq!(back.tables["unified_data"].rows, 3);
        assert_eq!(back.tables["unified_data"].columns, vec!["year"]);
        assert!(chrono::DateTime::parse_from_rfc3339(&back.generated_at).is_ok());
        Ok(())
    }
}
