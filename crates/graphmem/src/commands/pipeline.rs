//! Run the hook pipelines by hand.
//!
//! `recall` and `capture` use the uncontained pipeline entry points so the
//! reason for a skip, or the error behind a failure, is shown instead of
//! being swallowed the way the hooks do.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use graphmem_core::Config;
use graphmem_sdk::Turn;
use graphmem_sdk::capture::{CaptureOutcome, CaptureTrigger, build_episode, run_capture};
use graphmem_sdk::recall::{RecallOutcome, run_recall};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::connect;

/// Transcript file shapes accepted by `capture`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Transcript {
    Turns(Vec<Turn>),
    Payload { messages: Vec<Turn> },
}

impl Transcript {
    fn into_turns(self) -> Vec<Turn> {
        match self {
            Transcript::Turns(turns) | Transcript::Payload { messages: turns } => turns,
        }
    }
}

fn read_transcript(path: &Path) -> Result<Vec<Turn>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    let transcript: Transcript = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON transcript", path.display()))?;
    let turns = transcript.into_turns();
    debug!(path = %path.display(), count = turns.len(), "Loaded transcript");
    Ok(turns)
}

/// Print the block recall would prepend for `prompt`.
pub async fn recall(prompt: &str, config: &Config) -> Result<()> {
    let client = connect(config)?;
    let outcome = run_recall(Some(prompt), config, &client)
        .await
        .context("Recall failed")?;

    match outcome {
        RecallOutcome::Skipped(reason) => {
            println!("{} Recall skipped: {}", "○".yellow(), reason);
        }
        RecallOutcome::NoFacts => {
            println!("{}", "No relevant facts found".yellow());
        }
        RecallOutcome::Injected { facts, context } => {
            println!("{} {} fact(s) would be injected:", "✓".green(), facts.len());
            println!();
            println!("{context}");
        }
    }
    Ok(())
}

/// Run `trigger` over the transcript at `path`.
pub async fn capture(
    path: &Path,
    trigger: CaptureTrigger,
    dry_run: bool,
    config: &Config,
) -> Result<()> {
    let turns = read_transcript(path)?;
    debug!(%trigger, dry_run, "Running capture by hand");

    if dry_run {
        match build_episode(&turns, trigger, config) {
            Ok(draft) => {
                println!(
                    "{} {} line(s), {} chars ({})",
                    "Episode".cyan().bold(),
                    draft.lines,
                    draft.body.chars().count(),
                    trigger.source_description()
                );
                println!("{}", "─".repeat(60));
                println!("{}", draft.body);
            }
            Err(reason) => println!("{} Nothing to capture: {}", "○".yellow(), reason),
        }
        return Ok(());
    }

    let client = connect(config)?;
    let outcome = run_capture(&turns, trigger, config, &client)
        .await
        .context("Capture failed")?;

    match outcome {
        CaptureOutcome::Skipped(reason) => {
            println!("{} Capture skipped: {}", "○".yellow(), reason);
        }
        CaptureOutcome::Submitted {
            lines,
            chars,
            result,
        } => {
            if !result.success {
                bail!("Service rejected the episode: {}", result.message);
            }
            println!(
                "{} Submitted {} episode ({} lines, {} chars)",
                "✓".green(),
                trigger.to_string().cyan(),
                lines,
                chars
            );
            if !result.message.is_empty() {
                println!("  {}", result.message.dimmed());
            }
        }
    }
    Ok(())
}
