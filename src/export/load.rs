// src/export/load.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::path::Path;
use tracing::info;

use crate::error::PipelineError;
use crate::indicator::read::read_csv_as_text;
use crate::unified::{UnifiedTable, UNIFIED_ARTIFACT};

/// Reload the unified table a previous transform run left in `processed_dir`.
pub fn load_unified(processed_dir: &Path) -> Result<UnifiedTable> {
    let path = processed_dir.join(format!("{}.csv", UNIFIED_ARTIFACT));
    if !path.is_file() {
        return Err(PipelineError::MissingUpstreamArtifact {
            artifact: UNIFIED_ARTIFACT.to_string(),
            path,
        }
        .into());
    }

    let (schema, mut batches) = read_csv_as_text(&path)?;
    if batches.is_empty() {
        batches.push(RecordBatch::new_empty(schema));
    }
    let table = UnifiedTable::try_from_batches(&batches)
        .with_context(|| format!("validating {}", path.display()))?;

    info!(
        path = %path.display(),
        rows = table.len(),
        indicators = table.indicators().len(),
        "unified table loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ArtifactWriter, OutputFormat};
    use crate::indicator::RecordKey;
    use crate::unified::UnifiedRecord;
    use tempfile::tempdir;

    #[test]
    fn missing_artifact_is_typed() {
        let dir = tempdir().unwrap();
        let err = load_unified(dir.path()).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MissingUpstreamArtifact { artifact, .. }) => {
                assert_eq!(artifact, "unified_data")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn written_table_loads_back() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let table = UnifiedTable::new(
            vec!["poverty_rate".into(), "internet_access".into()],
            vec![
                UnifiedRecord {
                    key: RecordKey::new(2021, "MEX", "urban", "female"),
                    country_name: "México".into(),
                    values: vec![Some(33.5), None],
                },
                UnifiedRecord {
                    key: RecordKey::new(2022, "CRI", "total", "total"),
                    country_name: "Costa Rica".into(),
                    values: vec![Some(20.0), Some(81.25)],
                },
            ],
        );
        ArtifactWriter::new(dir.path(), &[OutputFormat::Csv])
            .write(UNIFIED_ARTIFACT, &table.to_record_batch()?)?;

        assert_eq!(load_unified(dir.path())?, table);
        Ok(())
    }

    #[test]
    fn header_only_artifact_is_an_empty_table() -> anyhow::Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("unified_data.csv"),
            "year,country_code,area,sex,country_name,gini\n",
        )?;
        let table = load_unified(dir.path())?;
        assert!(table.is_empty());
        assert_eq!(table.indicators(), &["gini"]);
        Ok(())
    }
}
