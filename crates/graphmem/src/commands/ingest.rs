//! Manual ingest command.

use anyhow::{Result, bail};
use colored::Colorize;
use graphmem_core::Config;
use graphmem_sdk::tools::{IngestArgs, ingest_tool};

use super::connect;

/// Submit content through the same path as the `graph_ingest` tool.
pub async fn execute(
    content: String,
    name: Option<String>,
    source: Option<String>,
    config: &Config,
) -> Result<()> {
    let client = connect(config)?;
    let output = ingest_tool(
        &client,
        IngestArgs {
            content,
            name,
            source,
        },
    )
    .await;

    if !output.success {
        bail!("{}", output.text);
    }

    println!("{} {}", "✓".green(), output.text);
    println!("  Group: {}", config.server.group_id.cyan());
    println!(
        "  {}",
        "Extraction runs asynchronously; facts appear once the service has processed it.".dimmed()
    );
    Ok(())
}
