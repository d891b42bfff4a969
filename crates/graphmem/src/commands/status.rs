//! Service status command.

use anyhow::Result;
use colored::Colorize;
use graphmem_core::{Config, Episode, GraphApi};
use serde::Serialize;

use super::connect;

const RECENT_EPISODES: usize = 5;

/// Status for JSON output.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub url: String,
    pub group_id: String,
    pub healthy: bool,
    pub recent_episodes: Vec<Episode>,
}

pub async fn execute(json: bool, config: &Config) -> Result<()> {
    let client = connect(config)?;

    let healthy = client.healthy().await;
    let recent_episodes = if healthy {
        client.episodes(RECENT_EPISODES).await
    } else {
        Vec::new()
    };

    let report = StatusReport {
        url: client.base_url().to_string(),
        group_id: client.group_id().to_string(),
        healthy,
        recent_episodes,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "graphmem Status".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  Service: {}", report.url);
    println!("  Group:   {}", report.group_id);
    print!("  Health:  ");
    if report.healthy {
        println!("{}", "✓ healthy".green());
    } else {
        println!("{}", "✗ unreachable".red());
        return Ok(());
    }

    println!();
    if report.recent_episodes.is_empty() {
        println!("  {}", "No episodes yet".dimmed());
    } else {
        println!("  {}", "Recent episodes:".cyan());
        for episode in &report.recent_episodes {
            println!(
                "    {} {} {}",
                "•".cyan(),
                episode.name,
                super::episodes::age(episode).dimmed()
            );
        }
    }

    Ok(())
}
