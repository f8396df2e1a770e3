use crate::api::RreoClient;
use crate::pipeline::Pipeline;
use crate::{Config, Result};
use std::sync::Arc;

/// Runs exactly one refresh cycle against the live API and exits.
pub async fn refresh(config: Config) -> Result<()> {
    let client = RreoClient::new(config.clone())?;
    let pipeline = Pipeline::new(config, Arc::new(client));
    pipeline.refresh_cycle().await?;
    Ok(())
}
