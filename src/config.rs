use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub csv_dir: PathBuf,
    pub page_size: u64,
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tmdb_catalog.db?mode=rwc".to_string());

        let csv_dir = std::env::var("CSV_DIR").unwrap_or_else(|_| "csv".to_string()).into();

        let page_size: u64 = std::env::var("PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(10);

        let batch_size: usize = std::env::var("INGEST_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(500);

        let show_progress = std::env::var("INGEST_PROGRESS")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            csv_dir,
            page_size,
            batch_size,
            show_progress,
        })
    }
}
