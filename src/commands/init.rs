use crate::{Config, Result};
use std::path::Path;
use tracing::info;

/// Creates the data directory and writes a default `config.json`.
pub async fn init(home: &Path) -> Result<()> {
    let config = Config::create(home).await?;
    info!(
        "Created configuration at {}, edit it to adjust the fiscal year, entity or server settings",
        config.config_path().display()
    );
    Ok(())
}
