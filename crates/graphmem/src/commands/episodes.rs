//! Recent episodes command.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use graphmem_core::{Config, Episode, GraphApi};

use super::connect;

const PREVIEW_CHARS: usize = 120;

pub async fn execute(last: usize, json: bool, config: &Config) -> Result<()> {
    let client = connect(config)?;
    let episodes = client.episodes(last.max(1)).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&episodes)?);
        return Ok(());
    }

    if episodes.is_empty() {
        println!("{}", "No episodes found".yellow());
        return Ok(());
    }

    println!(
        "{} {} episode(s) in {}",
        "Episodes".cyan().bold(),
        episodes.len(),
        client.group_id().cyan()
    );
    println!("{}", "─".repeat(60));
    for episode in &episodes {
        println!("{} {}", episode.name.bold(), age(episode).dimmed());
        if !episode.source_description.is_empty() {
            println!("  Source: {}", episode.source_description);
        }
        println!("  {}", preview(&episode.content));
        println!();
    }

    Ok(())
}

/// Relative age of an episode, e.g. `(3h ago)`.
pub(crate) fn age(episode: &Episode) -> String {
    let Some(created) = episode.created() else {
        return String::new();
    };
    let elapsed = Utc::now().signed_duration_since(created);
    if elapsed.num_days() > 0 {
        format!("({}d ago)", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("({}h ago)", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("({}m ago)", elapsed.num_minutes())
    } else {
        "(just now)".to_string()
    }
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
