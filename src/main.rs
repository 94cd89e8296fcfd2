use std::sync::Arc;

use tmdb_catalog::{AppState, catalog::Catalog, config::Config, db, init_tracing, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let db = db::connect_and_migrate(&config.database_url).await?;
    let state = Arc::new(AppState { catalog: Catalog::new(db, config.page_size) });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
