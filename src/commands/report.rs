use crate::cache::CsvCache;
use crate::model::Source;
use crate::report::Report;
use crate::{Config, Result};

/// Prints the monthly reconciliation table from the cached snapshots.
pub async fn report(config: Config) -> Result<()> {
    let tesouro = CsvCache::new(config.csv_path(Source::Tesouro)).read().await?;
    let siconfi = CsvCache::new(config.csv_path(Source::Siconfi)).read().await?;
    let report = Report::build(&tesouro, &siconfi);
    if report.meses.is_empty() {
        println!("No cached data yet, run 'icms refresh' first.");
        return Ok(());
    }
    print!("{}", report.render_table());
    Ok(())
}
