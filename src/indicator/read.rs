// src/indicator/read.rs

use anyhow::{Context, Result};
use arrow::{
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use glob::glob;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

use super::IndicatorTable;
use crate::columns::clean_str;
use crate::error::PipelineError;

const BATCH_SIZE: usize = 8_192;

/// All `*.csv` files directly under `raw_dir`, in sorted path order.
pub fn discover_indicator_files(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.csv", raw_dir.display());
    let mut files = Vec::new();
    for entry in glob(&pattern).context("invalid glob pattern for indicator discovery")? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("cannot read glob entry: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

/// Column names from the header record, parsed with the same CSV dialect as the body so
/// quoted names (commas included) line up with the reader's fields.
fn read_headers(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let (schema, _) = Format::default()
        .with_header(true)
        .with_quote(b'"')
        .with_delimiter(b',')
        .infer_schema(file, Some(0))
        .with_context(|| format!("reading header of {}", path.display()))?;

    Ok(schema
        .fields()
        .iter()
        .map(|f| clean_str(f.name().trim_start_matches('\u{feff}')))
        .collect())
}

/// Load a CSV with every column as Utf8. Typing and validation happen afterwards so a bad
/// cell is reported with its table, row and column rather than as a reader failure.
pub fn read_csv_as_text(path: &Path) -> Result<(Arc<Schema>, Vec<RecordBatch>)> {
    let headers = read_headers(path)?;
    let fields: Vec<Field> = headers
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    if headers.is_empty() {
        return Ok((schema, Vec::new()));
    }

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .with_quote(b'"')
        .with_delimiter(b',')
        .build(file)
        .with_context(|| format!("creating CSV reader for {}", path.display()))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.with_context(|| format!("reading CSV batch from {}", path.display()))?);
    }
    debug!(path = %path.display(), batches = batches.len(), "csv loaded");
    Ok((schema, batches))
}

/// Read one indicator source. The indicator's column name comes from the file stem.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_indicator_csv(path: &Path) -> Result<IndicatorTable> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no usable file stem in {}", path.display()))?;

    let (schema, mut batches) = read_csv_as_text(path)?;
    if batches.is_empty() {
        // a header-only file still has to pass the column checks
        batches.push(RecordBatch::new_empty(schema));
    }

    let table = IndicatorTable::try_from_batches(stem, &batches)
        .with_context(|| format!("validating indicator file {}", path.display()))?;
    info!(indicator = table.name(), rows = table.len(), "indicator loaded");
    Ok(table)
}

/// Discover and read every indicator file in `raw_dir`.
pub fn read_indicator_dir(raw_dir: &Path) -> Result<Vec<IndicatorTable>> {
    let files = discover_indicator_files(raw_dir)?;
    info!(dir = %raw_dir.display(), files = files.len(), "indicator files discovered");
    if files.is_empty() {
        return Err(PipelineError::EmptyInput)
            .with_context(|| format!("no *.csv files in {}", raw_dir.display()));
    }
    files.iter().map(|p| read_indicator_csv(p)).collect()
}
