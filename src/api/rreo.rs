//! Implements the `Upstream` trait against the Tesouro datalake RREO API.
//!
//! The API answers `GET <base>?an_exercicio=..&nr_periodo=..&...` with a JSON
//! body shaped `{ "items": [ {..}, {..} ] }`. Both sources use the same wire
//! format; they differ only in which base URL the config points them at.

use crate::api::Upstream;
use crate::model::{RevenueRecord, Source};
use crate::{Config, Result};
use anyhow::{bail, Context};
use tracing::debug;
use url::Url;

/// Live HTTP client for the RREO datalake endpoints.
pub struct RreoClient {
    config: Config,
    client: reqwest::Client,
}

impl RreoClient {
    /// Creates the client with the request timeout from config. The upstream
    /// has no SLA, so the timeout is the only bound on a refresh cycle.
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .context("Failed to build the HTTP client")?;
        Ok(Self { config, client })
    }

    fn url_for(&self, source: Source) -> Result<Url> {
        let mut url = Url::parse(self.config.base_url(source))
            .with_context(|| format!("Invalid base URL configured for {source}"))?;
        for (key, value) in self.config.query_params() {
            url.query_pairs_mut().append_pair(&key, &value);
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Upstream for RreoClient {
    async fn fetch_items(&self, source: Source) -> Result<Vec<RevenueRecord>> {
        let url = self.url_for(source)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {source} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{source} answered {status}");
        }

        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Response body from {source} is not valid JSON"))?;

        extract_items(&body).with_context(|| format!("Unexpected response shape from {source}"))
    }
}

/// Pulls the record list out of a response body. A body without an `items`
/// array is an error so the caller can distinguish "empty dataset" from
/// "the API changed shape under us".
fn extract_items(body: &serde_json::Value) -> Result<Vec<RevenueRecord>> {
    let items = body
        .get("items")
        .and_then(serde_json::Value::as_array)
        .context("response has no 'items' array")?;
    Ok(items
        .iter()
        .filter_map(RevenueRecord::from_json_object)
        .collect())
}
