// src/pipeline.rs

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::PipelineConfig;
use crate::export::{load_unified, ArtifactWriter, Manifest};
use crate::indicator::read_indicator_dir;
use crate::kpi::{KpiKind, KpiView};
use crate::unified::{UnifiedTable, UNIFIED_ARTIFACT};
use crate::unify::UnifyStats;

/// What `transform` produced.
#[derive(Debug, Clone)]
pub struct TransformReport {
    pub table: UnifiedTable,
    pub stats: UnifyStats,
}

/// Stage runner wiring readers, core and writers together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Raw indicator CSVs → unified table in the processed dir.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn transform(&self) -> Result<TransformReport> {
        let paths = &self.config.paths;

        // 1) read every indicator source
        let tables = read_indicator_dir(&paths.raw_dir)?;

        // 2) merge, then attach country names
        let outcome = self
            .config
            .unifier()?
            .unify(tables)
            .context("unifying indicator tables")?;
        let table = self
            .config
            .enricher()
            .enrich(outcome.table)
            .context("enriching unified table")?;

        // 3) persist the table and the manifest
        let writer = ArtifactWriter::new(&paths.processed_dir, &self.config.outputs);
        let batch = table.to_record_batch()?;
        let files = writer.write(UNIFIED_ARTIFACT, &batch)?;

        let mut manifest = Manifest::new().with_unify_stats(outcome.stats);
        manifest.record(UNIFIED_ARTIFACT, &batch, files);
        manifest.write(writer.dir())?;

        info!(
            rows = table.len(),
            indicators = table.indicators().len(),
            dir = %paths.processed_dir.display(),
            "transform done"
        );
        Ok(TransformReport {
            table,
            stats: outcome.stats,
        })
    }

    /// Unified table from the processed dir → the five KPI views in the analytics dir.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn analyze(&self) -> Result<BTreeMap<KpiKind, KpiView>> {
        let paths = &self.config.paths;

        // 1) reload what transform wrote
        let table = load_unified(&paths.processed_dir)?;

        // 2) derive the views
        let views = self
            .config
            .kpi_engine()
            .compute_kpis(&table)
            .context("computing KPI views")?;

        // 3) persist one artifact per view
        let writer = ArtifactWriter::new(&paths.analytics_dir, &self.config.outputs);
        let mut manifest = Manifest::new();
        for view in views.values() {
            let name = view.kind.table_name();
            let files = writer.write(&name, &view.batch)?;
            manifest.record(&name, &view.batch, files);
        }
        manifest.write(writer.dir())?;

        info!(
            views = views.len(),
            dir = %paths.analytics_dir.display(),
            "analyze done"
        );
        Ok(views)
    }

    /// `transform` then `analyze`.
    pub fn run(&self) -> Result<BTreeMap<KpiKind, KpiView>> {
        self.transform()?;
        self.analyze()
    }
}
