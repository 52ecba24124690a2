// src/export/write.rs

use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

use super::OutputFormat;

/// Persists named tables into one directory, once per configured format.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    formats: Vec<OutputFormat>,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>, formats: &[OutputFormat]) -> Self {
        let mut formats = formats.to_vec();
        formats.sort();
        formats.dedup();
        Self {
            dir: dir.into(),
            formats,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, table_name: &str, format: OutputFormat) -> PathBuf {
        self.dir
            .join(format!("{}.{}", table_name, format.extension()))
    }

    /// Write `batch` as `<dir>/<table_name>.<ext>` for every format and return the paths.
    #[tracing::instrument(level = "debug", skip(self, batch), fields(rows = batch.num_rows()))]
    pub fn write(&self, table_name: &str, batch: &RecordBatch) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating output dir {}", self.dir.display()))?;

        let mut written = Vec::with_capacity(self.formats.len());
        for &format in &self.formats {
            let path = self.path_for(table_name, format);
            write_atomic(&path, |file| match format {
                OutputFormat::Csv => write_csv(file, batch),
                OutputFormat::Parquet => write_parquet(file, batch),
            })?;
            info!(
                table = table_name,
                path = %path.display(),
                rows = batch.num_rows(),
                "artifact written"
            );
            written.push(path);
        }
        Ok(written)
    }
}

/// Write into a hidden sibling tmp file, sync it, then rename over `path`.
pub(crate) fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("no file name in {}", path.display()))?;
    let tmp_path = dir.join(format!(".{}.tmp", file_name));

    let mut tmp = File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let filled = fill(&mut tmp).and_then(|()| {
        tmp.sync_all()
            .with_context(|| format!("syncing {}", tmp_path.display()))
    });
    drop(tmp);
    if let Err(e) = filled {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} -> {}", tmp_path.display(), path.display()))?;
    Ok(())
}

fn write_csv(file: &mut File, batch: &RecordBatch) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch).context("writing CSV batch")?;
    writer.into_inner().flush().context("flushing CSV writer")?;
    Ok(())
}

fn write_parquet(file: &mut File, batch: &RecordBatch) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).context("creating parquet writer")?;
    writer.write(batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
