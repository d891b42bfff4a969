//! Recall pipeline: search the graph with the upcoming prompt and return a
//! context block for the host to prepend.
//!
//! Eligibility short-circuits in a fixed order (enabled, prompt length, skip
//! markers, health) so that cheap local checks run before any network call.

use graphmem_core::{Config, Fact, GraphApi, HealthGate};
use std::fmt;
use tracing::{debug, info};

use crate::containment::contain;
use crate::error::SdkResult;

pub const CONTEXT_OPEN: &str = "<graphiti-context>";
pub const CONTEXT_HEADER: &str = "Relevant knowledge graph facts (auto-recalled):";
pub const CONTEXT_CLOSE: &str = "</graphiti-context>";

/// Why recall did not search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecallSkip {
    Disabled,
    MissingPrompt,
    PromptTooShort { length: usize, minimum: usize },
    SkipMarker(String),
    Unhealthy,
}

impl fmt::Display for RecallSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecallSkip::Disabled => write!(f, "recall disabled"),
            RecallSkip::MissingPrompt => write!(f, "no prompt"),
            RecallSkip::PromptTooShort { length, minimum } => {
                write!(f, "prompt has {length} chars, need {minimum}")
            }
            RecallSkip::SkipMarker(marker) => write!(f, "prompt contains {marker}"),
            RecallSkip::Unhealthy => write!(f, "knowledge graph unavailable"),
        }
    }
}

/// Result of one recall run.
#[derive(Debug, Clone, PartialEq)]
pub enum RecallOutcome {
    Skipped(RecallSkip),
    NoFacts,
    Injected { facts: Vec<Fact>, context: String },
}

impl RecallOutcome {
    pub fn context(&self) -> Option<&str> {
        match self {
            RecallOutcome::Injected { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn into_context(self) -> Option<String> {
        match self {
            RecallOutcome::Injected { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Local eligibility checks, in order. Health is checked separately.
pub fn check_prompt<'a>(prompt: Option<&'a str>, config: &Config) -> Result<&'a str, RecallSkip> {
    if !config.recall.enabled {
        return Err(RecallSkip::Disabled);
    }
    let prompt = prompt.ok_or(RecallSkip::MissingPrompt)?;
    let length = prompt.chars().count();
    if length < config.recall.min_prompt_length {
        return Err(RecallSkip::PromptTooShort {
            length,
            minimum: config.recall.min_prompt_length,
        });
    }
    if let Some(marker) = config.filters.skip_marker_in(prompt) {
        return Err(RecallSkip::SkipMarker(marker.to_string()));
    }
    Ok(prompt)
}

/// Render facts as the injected context block; `None` when there are none.
pub fn format_facts(facts: &[Fact]) -> Option<String> {
    if facts.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(facts.len() + 3);
    lines.push(CONTEXT_OPEN.to_string());
    lines.push(CONTEXT_HEADER.to_string());
    lines.extend(facts.iter().map(|f| format!("- **{}**: {}", f.name, f.fact)));
    lines.push(CONTEXT_CLOSE.to_string());
    Some(lines.join("\n"))
}

/// Run recall, propagating search failures.
pub async fn run_recall(
    prompt: Option<&str>,
    config: &Config,
    graph: &dyn GraphApi,
) -> SdkResult<RecallOutcome> {
    let prompt = match check_prompt(prompt, config) {
        Ok(prompt) => prompt,
        Err(skip) => {
            debug!(reason = %skip, "Recall skipped");
            return Ok(RecallOutcome::Skipped(skip));
        }
    };

    if !HealthGate::new(graph).check("recall").await {
        return Ok(RecallOutcome::Skipped(RecallSkip::Unhealthy));
    }

    let facts = graph.search(prompt, config.recall.max_facts).await?;
    match format_facts(&facts) {
        Some(context) => {
            info!(count = facts.len(), "Recalled facts into context");
            Ok(RecallOutcome::Injected { facts, context })
        }
        None => Ok(RecallOutcome::NoFacts),
    }
}

/// Contained recall: the context block to prepend, or nothing.
pub async fn recall(prompt: Option<&str>, config: &Config, graph: &dyn GraphApi) -> Option<String> {
    contain("recall", run_recall(prompt, config, graph))
        .await
        .and_then(RecallOutcome::into_context)
}
