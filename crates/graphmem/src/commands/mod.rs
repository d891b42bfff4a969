//! Command implementations for graphmem CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod config;
pub mod episodes;
pub mod ingest;
pub mod pipeline;
pub mod search;
pub mod status;

use anyhow::{Context, Result};
use graphmem_core::{Config, GraphClient};
use tracing::debug;

/// Validate the configuration and build a client for it.
pub(crate) fn connect(config: &Config) -> Result<GraphClient> {
    config.validate().context("Invalid configuration")?;
    debug!(
        url = %config.server.url,
        group_id = %config.server.group_id,
        token = config.server.token.is_some(),
        "Connecting to knowledge graph"
    );
    GraphClient::from_config(&config.server).context("Failed to create knowledge graph client")
}
