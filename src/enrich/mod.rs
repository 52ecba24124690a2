// src/enrich/mod.rs

use tracing::info;

use crate::config::CountryCatalog;
use crate::error::{PipelineError, Result};
use crate::unified::{UnifiedRecord, UnifiedTable};
use crate::unify::KeyedTable;

/// Attaches `country_name` through the closed catalog.
#[derive(Debug, Clone)]
pub struct Enricher {
    catalog: CountryCatalog,
}

impl Enricher {
    pub fn new(catalog: CountryCatalog) -> Self {
        Self { catalog }
    }

    /// Fails on the first code outside the catalog. Row numbers in the error are one-based.
    #[tracing::instrument(level = "info", skip_all, fields(rows = table.len()))]
    pub fn enrich(&self, table: KeyedTable) -> Result<UnifiedTable> {
        let (indicators, rows) = table.into_parts();

        let mut records = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            let name = self
                .catalog
                .name_of(&row.key.country_code)
                .ok_or_else(|| PipelineError::UnknownCountry {
                    code: row.key.country_code.clone(),
                    row: idx + 1,
                })?;
            records.push(UnifiedRecord {
                country_name: name.to_string(),
                key: row.key,
                values: row.values,
            });
        }

        info!(rows = records.len(), "country names attached");
        Ok(UnifiedTable::new(indicators, records))
    }
}
