use crate::api::RreoClient;
use crate::pipeline::Pipeline;
use crate::scheduler::Scheduler;
use crate::{server, Config, Result};
use std::sync::Arc;
use tracing::info;

/// Runs the refresh scheduler and the HTTP API until ctrl-c.
pub async fn serve(config: Config) -> Result<()> {
    let interval = config.refresh_interval();
    let client = RreoClient::new(config.clone())?;
    let pipeline = Arc::new(Pipeline::new(config, Arc::new(client)));

    let scheduler = Scheduler::start(Arc::clone(&pipeline), interval);

    tokio::select! {
        result = server::serve(pipeline) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c, shutting down");
        }
    }

    scheduler.stop();
    Ok(())
}
