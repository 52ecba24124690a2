// src/config/mod.rs

pub mod countries;

pub use countries::CountryCatalog;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::enrich::Enricher;
use crate::error::PipelineError;
use crate::export::OutputFormat;
use crate::kpi::{KpiEngine, RankingPolicy};
use crate::unify::{CompletenessPolicy, Unifier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// One CSV per indicator.
    pub raw_dir: PathBuf,
    /// Unified table output.
    pub processed_dir: PathBuf,
    /// KPI views output.
    pub analytics_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            analytics_dir: PathBuf::from("data/analytics"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompletenessConfig {
    /// Share of indicators a row must carry to be kept. `1.0` keeps only complete rows.
    pub min_coverage: f64,
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self { min_coverage: 1.0 }
    }
}

/// Everything a run needs. Every field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub countries: CountryCatalog,
    pub ranking: RankingPolicy,
    pub completeness: CompletenessConfig,
    pub outputs: Vec<OutputFormat>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            countries: CountryCatalog::default(),
            ranking: RankingPolicy::default(),
            completeness: CompletenessConfig::default(),
            outputs: vec![OutputFormat::Csv],
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: PipelineConfig = if raw.trim().is_empty() {
            PipelineConfig::default()
        } else {
            serde_yaml::from_str(raw).context("parsing pipeline config YAML")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to the built-in defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("no config file given, using defaults");
            let config = PipelineConfig::default();
            config.validate()?;
            return Ok(config);
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_yaml_str(&raw)
            .with_context(|| format!("loading config {}", path.display()))?;
        info!(
            path = %path.display(),
            countries = config.countries.len(),
            "config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.countries.validate()?;
        self.completeness_policy()?;
        if self.outputs.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one output format is required".into(),
            ));
        }
        Ok(())
    }

    pub fn completeness_policy(&self) -> crate::error::Result<CompletenessPolicy> {
        CompletenessPolicy::from_min_coverage(self.completeness.min_coverage)
    }

    pub fn unifier(&self) -> crate::error::Result<Unifier> {
        Ok(Unifier::new(self.completeness_policy()?))
    }

    pub fn enricher(&self) -> Enricher {
        Enricher::new(self.countries.clone())
    }

    pub fn kpi_engine(&self) -> KpiEngine {
        KpiEngine::new(self.ranking.clone())
    }
}
