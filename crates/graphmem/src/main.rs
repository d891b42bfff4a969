//! graphmem - Knowledge graph memory CLI
//!
//! Talks to the same service as the agent hooks, using the same
//! configuration, so what the hooks would recall or capture can be checked
//! from a terminal.

use anyhow::{Context, Result};
use clap::Parser;
use graphmem_core::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("graphmem=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = load_config(&config_path, cli.url.as_deref(), cli.group.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Status { json } => commands::status::execute(json, &config).await,
        Commands::Search { query, limit, json } => {
            commands::search::search(&query, limit, json, &config).await
        }
        Commands::Context {
            text,
            max_facts,
            json,
        } => commands::search::context(&text, max_facts, json, &config).await,
        Commands::Ingest {
            content,
            name,
            source,
        } => commands::ingest::execute(content, name, source, &config).await,
        Commands::Episodes { last, json } => commands::episodes::execute(last, json, &config).await,
        Commands::Recall { prompt } => commands::pipeline::recall(&prompt, &config).await,
        Commands::Capture {
            file,
            trigger,
            dry_run,
        } => commands::pipeline::capture(&file, trigger, dry_run, &config).await,
        Commands::Config { path, init } => {
            commands::config::execute(&config_path, path, init, &config)
        }
    }
}

/// File, then environment, then command-line overrides.
///
/// Validation happens when a command connects, so `config` can still show a
/// broken configuration.
fn load_config(path: &Path, url: Option<&str>, group: Option<&str>) -> Result<Config> {
    let mut config = Config::load_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_env(|key| std::env::var(key).ok());

    if let Some(url) = url {
        config.server.url = url.to_string();
    }
    if let Some(group) = group {
        config.server.group_id = group.to_string();
    }
    Ok(config)
}
