// src/export/mod.rs

pub mod load;
pub mod manifest;
pub mod write;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use load::load_unified;
pub use manifest::{Manifest, TableEntry, MANIFEST_FILE};
pub use write::ArtifactWriter;

/// On-disk encoding of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
