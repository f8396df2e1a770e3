//! The refresh pipeline: fetch both sources, filter, and replace the CSV
//! snapshots.
//!
//! Fetch failures are downgraded to empty lists here so that one source's
//! outage never aborts the other's ingestion, and an empty filtered set
//! leaves the previous snapshot in place (see `CsvCache::write`). Only local
//! problems (an unwritable data directory, mostly) surface as errors.

use crate::api::Upstream;
use crate::cache::{CsvCache, WriteOutcome};
use crate::filter::filter_records;
use crate::model::{RevenueRecord, Source};
use crate::{Config, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Whether a trigger actually ran a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// Another cycle was already in flight; this trigger was dropped.
    Skipped,
}

/// Owns one run of fetch → filter → cache for both sources.
pub struct Pipeline {
    config: Config,
    upstream: Arc<dyn Upstream + Send + Sync>,
    in_flight: Mutex<()>,
}

impl Pipeline {
    pub fn new(config: Config, upstream: Arc<dyn Upstream + Send + Sync>) -> Self {
        Self {
            config,
            upstream,
            in_flight: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The snapshot cache for one source.
    pub fn cache(&self, source: Source) -> CsvCache {
        CsvCache::new(self.config.csv_path(source))
    }

    /// Runs one refresh cycle. The two fetches run concurrently and neither
    /// cancels the other. Cycles are non-reentrant: a trigger that arrives
    /// while one is in flight is skipped, not queued.
    pub async fn refresh_cycle(&self) -> Result<CycleOutcome> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("A refresh cycle is already in flight, skipping this trigger");
            return Ok(CycleOutcome::Skipped);
        };

        info!("Fetching data from Tesouro and SICONFI");
        let (tesouro, siconfi) = tokio::join!(
            self.fetch_soft(Source::Tesouro),
            self.fetch_soft(Source::Siconfi),
        );

        self.ingest(Source::Tesouro, tesouro).await?;
        self.ingest(Source::Siconfi, siconfi).await?;
        Ok(CycleOutcome::Completed)
    }

    /// Fetches one source, swallowing upstream failures as "no data".
    async fn fetch_soft(&self, source: Source) -> Vec<RevenueRecord> {
        match self.upstream.fetch_items(source).await {
            Ok(records) => {
                info!("{source}: {} raw records", records.len());
                records
            }
            Err(e) => {
                warn!("{source}: fetch failed, treating as no data: {e:#}");
                Vec::new()
            }
        }
    }

    async fn ingest(&self, source: Source, raw: Vec<RevenueRecord>) -> Result<()> {
        let filtered = filter_records(raw, self.config.anexo());
        info!("{source}: {} filtered records", filtered.len());
        match self.cache(source).write(&filtered).await? {
            WriteOutcome::Written(count) => {
                info!("{source}: snapshot updated with {count} records");
            }
            WriteOutcome::SkippedEmpty => {
                warn!("{source}: no valid data this cycle, keeping the previous snapshot");
            }
        }
        Ok(())
    }
}
