//! Loads the five CSV exports from `CSV_DIR` into the catalog database.

use anyhow::Context;
use tmdb_catalog::{
    config::Config,
    db, init_tracing,
    ingest::{self, CsvSources, LoadOptions},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let sources = CsvSources::in_dir(&config.csv_dir);
    let db = db::connect_and_migrate(&config.database_url).await?;

    let report = ingest::run(&db, &sources, LoadOptions::from(&config))
        .await
        .with_context(|| format!("loading CSV from {}", config.csv_dir.display()))?;

    println!("Loading CSV took: {:.2} seconds.", report.elapsed.as_secs_f64());
    Ok(())
}
