//! allowlist-sync - keeps a Hasura query allow-list in sync with local
//! GraphQL documents.
//!
//! Builds the collection of named queries with allowlist-engine, compares it
//! with the collection on the Hasura instance (or in a local JSON file) and
//! publishes the difference.

mod config;
mod confirm;
mod error;
mod hasura;
mod loader;
mod preview;
mod sync;
mod target;

use crate::config::{Cli, Config};
use crate::confirm::{AutoConfirm, StdinConfirm};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "allowlist_sync=info,allowlist_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Environment first so clap sees variables from .env
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: Cli) -> error::Result<()> {
    let config = Config::from_cli(cli)?;
    tracing::info!(
        collection = %config.collection,
        paths = config.paths.len(),
        versioned = config.sync.version.is_some(),
        reset = config.sync.reset,
        "starting sync"
    );

    if config.force_replace {
        sync::run(&config, &AutoConfirm).await?;
    } else {
        sync::run(&config, &StdinConfirm).await?;
    }
    Ok(())
}
