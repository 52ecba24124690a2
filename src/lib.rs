pub mod columns;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod indicator;
pub mod kpi;
pub mod pipeline;
pub mod unified;
pub mod unify;

pub use config::{CountryCatalog, PipelineConfig};
pub use enrich::Enricher;
pub use error::PipelineError;
pub use indicator::{IndicatorTable, RecordKey};
pub use kpi::{KpiEngine, KpiKind, KpiView};
pub use pipeline::Pipeline;
pub use unified::UnifiedTable;
pub use unify::{CompletenessPolicy, Unifier};
