//! The refresh scheduler.
//!
//! Owns a background task that runs one refresh cycle immediately and then
//! one per interval (six hours by default). It is an explicit object with a
//! start/stop lifecycle rather than an ambient global timer, so tests can
//! drive `Pipeline::refresh_cycle` directly and never wait on the wall clock.

use crate::pipeline::Pipeline;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Periodically re-runs the refresh pipeline. Dropping or `stop`ping the
/// scheduler ends the background task; in-flight HTTP requests are abandoned
/// with it, which is fine for an idempotent read-only fetch.
pub struct Scheduler {
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawns the refresh loop: one cycle now, then one every `interval`.
    /// Cycle errors are logged and the loop keeps going; the next tick is the
    /// retry policy.
    pub fn start(pipeline: Arc<Pipeline>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately, which doubles as the
            // refresh-at-startup requirement.
            loop {
                ticker.tick().await;
                info!("Refresh tick at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
                if let Err(e) = pipeline.refresh_cycle().await {
                    error!("Refresh cycle failed: {e:#}");
                }
            }
        });
        Self { handle }
    }

    /// Stops the background task.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Upstream;
    use crate::model::{RevenueRecord, Source};
    use crate::{Config, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts fetches instead of hitting the network. Each cycle fetches
    /// both sources, so one cycle adds two.
    struct CountingUpstream {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Upstream for CountingUpstream {
        async fn fetch_items(&self, _source: Source) -> Result<Vec<RevenueRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    async fn wait_for_calls(upstream: &CountingUpstream, expected: usize) {
        for _ in 0..100 {
            if upstream.calls.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {expected} upstream calls, saw {}",
            upstream.calls.load(Ordering::SeqCst)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_at_start_then_per_interval() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path().join("home")).await.unwrap();
        let interval = config.refresh_interval();
        let upstream = Arc::new(CountingUpstream {
            calls: AtomicUsize::new(0),
        });
        let pipeline = Arc::new(Pipeline::new(
            config,
            Arc::clone(&upstream) as Arc<dyn Upstream + Send + Sync>,
        ));

        let scheduler = Scheduler::start(Arc::clone(&pipeline), interval);

        // One cycle fires immediately at startup.
        wait_for_calls(&upstream, 2).await;

        // The next cycle fires after one interval.
        tokio::time::advance(interval).await;
        wait_for_calls(&upstream, 4).await;

        // After stop, advancing another interval runs nothing.
        scheduler.stop();
        tokio::time::advance(interval).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 4);
    }
}
