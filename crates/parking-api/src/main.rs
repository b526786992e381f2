//! `parking-api` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use anyhow::{Context as _, Result};

use parking_api::config::Config;
use parking_api::server::Server;
use parking_core::observability::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("load configuration")?;

    init_logging(config.log_format());
    tracing::info!(
        slot_count = config.slot_count,
        debug = config.debug,
        "Configuration loaded"
    );

    let server = Server::new(config);
    server.serve().await.context("run parking API server")?;
    Ok(())
}
