pub mod cli;
pub mod coordinator;
pub mod core;
pub mod providers;
pub mod store;

use crate::coordinator::{CoordinatorOptions, FetchCoordinator};
use crate::core::SystemClock;
use crate::core::config::AppConfig;
use crate::providers::HttpRateClient;
use crate::store::RateStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Rates,
    History { limit: usize },
    Convert { amount: f64, from: String, to: String },
    Status,
}

/// Wires the store, HTTP client and coordinator from `config`.
///
/// Falls back to an in-memory store when the data directory cannot be opened,
/// so rates still work for the current run.
pub fn build_coordinator(config: &AppConfig) -> Result<FetchCoordinator> {
    let store = match config.data_path().and_then(|path| RateStore::open(&path)) {
        Ok(store) => store,
        Err(e) => {
            warn!("Rate store unavailable, caching in memory only: {e:#}");
            RateStore::in_memory()
        }
    };

    let client = HttpRateClient::new(&config.providers, config.request_timeout())?;
    Ok(FetchCoordinator::new(
        Arc::new(client),
        Arc::new(store),
        Arc::new(SystemClock),
        CoordinatorOptions {
            ttl: config.cache_ttl(),
            retry: config.retry_policy(),
        },
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rateboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let coordinator = build_coordinator(&config)?;

    match command {
        AppCommand::Rates => cli::rates::run(&coordinator).await,
        AppCommand::History { limit } => cli::history::run(&coordinator, limit).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(&coordinator, amount, &from, &to).await
        }
        AppCommand::Status => {
            cli::status::run(&coordinator, config.cache_ttl());
            Ok(())
        }
    }
}
