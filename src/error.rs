// src/error.rs

use arrow::error::ArrowError;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for the unify / enrich / KPI core.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure the core can raise. All of them are fatal for the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An input table is missing a required column, or a cell cannot be read.
    #[error("schema error in `{table}`: {reason}")]
    Schema { table: String, reason: String },

    /// The unifier was handed zero indicator tables.
    #[error("no indicator tables supplied to the unifier")]
    EmptyInput,

    /// A country code outside the configured catalog.
    #[error("unknown country code `{code}` at row {row}")]
    UnknownCountry { code: String, row: usize },

    /// A stage asked for an artifact an earlier stage should have produced.
    #[error("missing upstream artifact `{artifact}` (expected at {})", path.display())]
    MissingUpstreamArtifact { artifact: String, path: PathBuf },

    /// Two inputs resolve to the same indicator column.
    #[error("indicator `{0}` is supplied by more than one input table")]
    DuplicateIndicator(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl PipelineError {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        PipelineError::Schema {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    /// Invalid cell; `row` is zero-based, reported one-based like a spreadsheet.
    pub(crate) fn invalid_cell(table: &str, row: usize, column: &str, detail: &str) -> Self {
        PipelineError::Schema {
            table: table.to_string(),
            reason: format!("row {}, column `{}`: {}", row + 1, column, detail),
        }
    }
}
