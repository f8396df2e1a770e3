//! CSV snapshot cache.
//!
//! Each source owns one CSV file in the data directory holding the filtered
//! record set from the most recent successful refresh cycle. Writes are full
//! snapshot replacements done through a temp file and an atomic rename, so a
//! concurrent reader never sees a half-written file. An empty record set is
//! never written: the previous snapshot is the better answer until the
//! upstream recovers.

use crate::model::RevenueRecord;
use crate::{utils, Result};
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What a `write` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The snapshot was replaced with this many records.
    Written(usize),
    /// The record set was empty; the existing snapshot (if any) was kept.
    SkippedEmpty,
}

/// One source's snapshot file.
#[derive(Debug, Clone)]
pub struct CsvCache {
    path: PathBuf,
}

impl CsvCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once a refresh cycle has produced a snapshot.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces the snapshot with `records`. The header row is derived from
    /// the record field names. Empty input is reported as `SkippedEmpty`
    /// without touching the file.
    pub async fn write(&self, records: &[RevenueRecord]) -> Result<WriteOutcome> {
        if records.is_empty() {
            return Ok(WriteOutcome::SkippedEmpty);
        }

        let headers = RevenueRecord::headers(records);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&headers)
            .context("Unable to write the CSV header row")?;
        for record in records {
            writer
                .write_record(record.to_row(&headers))
                .context("Unable to write a CSV row")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to finish the CSV buffer: {e}"))?;

        // Temp file in the same directory so the rename stays on one
        // filesystem. These are blocking calls, so they run off the runtime
        // threads.
        let dir = self
            .path
            .parent()
            .with_context(|| format!("Cache path has no parent: {}", self.path.display()))?
            .to_path_buf();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)
                .with_context(|| format!("Unable to create a temp file in {}", dir.display()))?;
            tmp.write_all(&bytes)
                .context("Unable to write the CSV temp file")?;
            tmp.persist(&path)
                .map_err(|e| e.error)
                .with_context(|| format!("Unable to replace snapshot {}", path.display()))?;
            Ok(())
        })
        .await
        .context("The snapshot write task failed")??;

        Ok(WriteOutcome::Written(records.len()))
    }

    /// Reads the snapshot back. A missing file means "no data yet" and
    /// returns an empty list.
    pub async fn read(&self) -> Result<Vec<RevenueRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let content = utils::read(&self.path).await?;
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .context("Unable to read the CSV header row")?
            .iter()
            .map(String::from)
            .collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.with_context(|| {
                format!("Malformed CSV row in snapshot {}", self.path.display())
            })?;
            let values: Vec<&str> = row.iter().collect();
            records.push(RevenueRecord::from_fields(&headers, &values));
        }
        Ok(records)
    }

    /// Reads the snapshot as raw bytes for the download endpoints.
    pub async fn read_raw(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Unable to read snapshot {}", self.path.display()))
    }
}
