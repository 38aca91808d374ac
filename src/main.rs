//! Duty board - a small web service that mirrors the evening duty
//! schedule from a Google Sheet.
//!
//! A background task refreshes the roster on a fixed interval; the HTTP
//! layer serves the duty board, `/health`, and `/version` from in-memory
//! snapshots only then.

mod cache;
mod config;
mod health;
mod query;
mod roster;
mod server;
mod sheets;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cache::RosterCache;
use config::{Config, EVENING_DUTY_TAB};
use health::HealthReporter;
use query::RosterQuery;
use server::AppState;
use sheets::SheetsClient;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env().context("configuration error")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        refresh_interval_secs = config.refresh_interval.as_secs(),
        timezone = %config.timezone,
        listen_addr = %config.listen_addr,
        "Duty board starting"
    );

    let client = SheetsClient::new(&config.sheet_url, &config.credentials_file)
        .context("sheets client setup failed")?;

    let cache = Arc::new(RosterCache::new());

    // Single writer: the refresh loop. Its first tick fires immediately,
    // so the board fills in as soon as the first fetch lands.
    tokio::spawn(cache::refresh::run(
        cache.clone(),
        client,
        EVENING_DUTY_TAB.to_string(),
        config.timezone,
        config.refresh_interval,
    ));

    let state = Arc::new(AppState::new(
        RosterQuery::new(cache.clone(), config.timezone),
        HealthReporter::new(cache.clone(), config.refresh_interval, config.tolerance_factor),
        cache,
    ));

    server::run(&config.listen_addr, state)
        .await
        .context("server error")?;

    Ok(())
}
