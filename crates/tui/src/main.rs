mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tracing_subscriber::{prelude::*, EnvFilter};
use ussdsim_core::{
    catalog::{self, Catalog},
    config::{self, AppConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let catalog = match config.catalog_path.as_ref() {
        Some(path) => catalog::load_catalog_file(path)?,
        None => Catalog::builtin().clone(),
    };
    tracing::info!(
        menus = catalog.menu_count(),
        loaded_at = %catalog.loaded_at(),
        "Catalog ready"
    );

    let mut app = app::HandsetApp::new(config, catalog);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("ussdsim.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
