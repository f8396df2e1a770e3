mod rreo;

pub use rreo::RreoClient;

use crate::model::{RevenueRecord, Source};
use crate::Result;

/// The seam between the refresh pipeline and the datalake HTTP API. The live
/// implementation is `RreoClient`; tests substitute a stub so refresh cycles
/// run deterministically without the network.
#[async_trait::async_trait]
pub trait Upstream {
    /// Fetches the raw record list for one source. Errors here are not fatal:
    /// the pipeline downgrades them to an empty list for that source.
    async fn fetch_items(&self, source: Source) -> Result<Vec<RevenueRecord>>;
}
