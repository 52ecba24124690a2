// src/kpi/mod.rs

pub mod aggregate;
pub mod rank;
pub mod regional;
pub mod stats;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use std::{collections::BTreeMap, fmt};
use tracing::info;

use crate::error::Result;
use crate::unified::UnifiedTable;

pub use aggregate::{evolucion_temporal, pais_anio, promedios_pais};
pub use rank::{competition_rank, rankings, Direction, RankingPolicy};
pub use regional::comparacion_regional;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KpiKind {
    PromediosPais,
    EvolucionTemporal,
    PaisAnio,
    Rankings,
    ComparacionRegional,
}

impl KpiKind {
    pub const ALL: [KpiKind; 5] = [
        KpiKind::PromediosPais,
        KpiKind::EvolucionTemporal,
        KpiKind::PaisAnio,
        KpiKind::Rankings,
        KpiKind::ComparacionRegional,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KpiKind::PromediosPais => "promedios_pais",
            KpiKind::EvolucionTemporal => "evolucion_temporal",
            KpiKind::PaisAnio => "pais_año",
            KpiKind::Rankings => "rankings",
            KpiKind::ComparacionRegional => "comparacion_regional",
        }
    }

    /// Artifact stem the view is persisted under.
    pub fn table_name(self) -> String {
        format!("kpi_{}", self.name())
    }
}

impl fmt::Display for KpiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct KpiView {
    pub kind: KpiKind,
    pub batch: RecordBatch,
}

/// Derives the five read-only views from a unified table.
#[derive(Debug, Clone, Default)]
pub struct KpiEngine {
    ranking: RankingPolicy,
}

impl KpiEngine {
    pub fn new(ranking: RankingPolicy) -> Self {
        Self { ranking }
    }

    pub fn compute(&self, kind: KpiKind, table: &UnifiedTable) -> Result<KpiView> {
        let batch = match kind {
            KpiKind::PromediosPais => promedios_pais(table)?,
            KpiKind::EvolucionTemporal => evolucion_temporal(table)?,
            KpiKind::PaisAnio => pais_anio(table)?,
            KpiKind::Rankings => rankings(table, &self.ranking)?,
            KpiKind::ComparacionRegional => comparacion_regional(table)?,
        };
        Ok(KpiView { kind, batch })
    }

    /// All five views. They only read `table`, so they are computed in parallel.
    #[tracing::instrument(level = "info", skip_all, fields(rows = table.len()))]
    pub fn compute_kpis(&self, table: &UnifiedTable) -> Result<BTreeMap<KpiKind, KpiView>> {
        let views = KpiKind::ALL
            .par_iter()
            .map(|&kind| self.compute(kind, table).map(|v| (kind, v)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        for view in views.values() {
            info!(
                view = %view.kind,
                rows = view.batch.num_rows(),
                columns = view.batch.num_columns(),
                "kpi view ready"
            );
        }
        Ok(views)
    }
}
