//! Capture pipeline: submit conversation text as a single episode before the
//! host discards it.
//!
//! Each [`CaptureTrigger`] fixes its own policy (minimum turns, per-turn
//! character cap, line window, source description). The episode body is built
//! by the pure [`build_episode`]; [`run_capture`] adds the enabled check, the
//! health gate and the ingest call.

use chrono::{DateTime, Utc};
use graphmem_core::time::{format_datetime, now_utc};
use graphmem_core::{Config, GraphApi, HealthGate, IngestResult, Message, RoleType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::containment::contain;
use crate::content::{Turn, normalize_turns, truncate_chars};
use crate::error::{SdkError, SdkResult};

/// Fewest usable lines worth submitting.
pub const MIN_LINES: usize = 2;

/// `role` of every captured message.
pub const CAPTURE_ROLE: &str = "conversation";

/// Lifecycle event that started a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTrigger {
    /// Context is about to be summarized and dropped
    Compaction,
    /// Session is being reset
    Reset,
    /// A turn completed successfully
    TurnEnd,
}

impl CaptureTrigger {
    pub fn min_turns(self) -> usize {
        match self {
            CaptureTrigger::Compaction | CaptureTrigger::Reset => 4,
            CaptureTrigger::TurnEnd => 2,
        }
    }

    pub fn per_turn_chars(self) -> usize {
        match self {
            CaptureTrigger::Compaction | CaptureTrigger::TurnEnd => 2000,
            CaptureTrigger::Reset => 1000,
        }
    }

    /// Most recent lines kept, `None` for all of them
    pub fn window(self) -> Option<usize> {
        match self {
            CaptureTrigger::Compaction => None,
            CaptureTrigger::Reset => Some(20),
            CaptureTrigger::TurnEnd => Some(2),
        }
    }

    pub fn source_description(self) -> &'static str {
        match self {
            CaptureTrigger::Compaction => "pre-compaction conversation",
            CaptureTrigger::Reset => "session reset",
            CaptureTrigger::TurnEnd => "completed turn",
        }
    }

    pub fn name_prefix(self) -> &'static str {
        match self {
            CaptureTrigger::Compaction => "pre-compaction",
            CaptureTrigger::Reset => "session-reset",
            CaptureTrigger::TurnEnd => "turn-end",
        }
    }

    fn is_enabled(self, config: &Config) -> bool {
        match self {
            CaptureTrigger::Compaction | CaptureTrigger::Reset => config.capture.enabled,
            CaptureTrigger::TurnEnd => config.capture.on_turn_end,
        }
    }
}

impl fmt::Display for CaptureTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTrigger::Compaction => write!(f, "compaction"),
            CaptureTrigger::Reset => write!(f, "reset"),
            CaptureTrigger::TurnEnd => write!(f, "turn_end"),
        }
    }
}

impl FromStr for CaptureTrigger {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "compaction" => Ok(CaptureTrigger::Compaction),
            "reset" => Ok(CaptureTrigger::Reset),
            "turn_end" => Ok(CaptureTrigger::TurnEnd),
            other => Err(SdkError::invalid_input(format!(
                "unknown capture trigger '{other}' (expected compaction, reset or turn_end)"
            ))),
        }
    }
}

/// Why capture did not submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSkip {
    Disabled,
    TooFewTurns { count: usize, minimum: usize },
    Unhealthy,
    TooFewLines { count: usize },
}

impl fmt::Display for CaptureSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSkip::Disabled => write!(f, "capture disabled"),
            CaptureSkip::TooFewTurns { count, minimum } => {
                write!(f, "{count} turns, need {minimum}")
            }
            CaptureSkip::Unhealthy => write!(f, "knowledge graph unavailable"),
            CaptureSkip::TooFewLines { count } => {
                write!(f, "{count} usable lines, need {MIN_LINES}")
            }
        }
    }
}

/// Episode body ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDraft {
    pub body: String,
    /// Lines in the body after windowing
    pub lines: usize,
}

/// Build the episode body from normalized, filtered turns.
pub fn build_episode(
    turns: &[Turn],
    trigger: CaptureTrigger,
    config: &Config,
) -> Result<EpisodeDraft, CaptureSkip> {
    let per_turn = trigger.per_turn_chars();
    let mut lines: Vec<String> = normalize_turns(turns)
        .into_iter()
        .filter(|turn| config.filters.skip_marker_in(&turn.text).is_none())
        .filter(|turn| !config.filters.is_acknowledgement(&turn.text))
        .map(|turn| format!("{}: {}", turn.speaker, truncate_chars(&turn.text, per_turn)))
        .collect();

    if lines.len() < MIN_LINES {
        return Err(CaptureSkip::TooFewLines { count: lines.len() });
    }

    if let Some(window) = trigger.window() {
        if lines.len() > window {
            lines.drain(..lines.len() - window);
        }
    }

    let joined = lines.join("\n\n");
    let body = truncate_chars(&joined, config.capture.max_episode_chars).to_string();
    Ok(EpisodeDraft {
        body,
        lines: lines.len(),
    })
}

/// The single message submitted for a draft.
pub fn episode_message(
    draft: &EpisodeDraft,
    trigger: CaptureTrigger,
    now: DateTime<Utc>,
) -> Message {
    Message::new(RoleType::User, CAPTURE_ROLE, draft.body.clone())
        .with_name(format!("{}-{}", trigger.name_prefix(), now.timestamp_millis()))
        .with_timestamp(format_datetime(&now))
        .with_source_description(trigger.source_description())
}

/// Result of one capture run.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Skipped(CaptureSkip),
    Submitted {
        lines: usize,
        chars: usize,
        result: IngestResult,
    },
}

impl CaptureOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, CaptureOutcome::Submitted { .. })
    }
}

/// Run capture, propagating ingest failures.
pub async fn run_capture(
    turns: &[Turn],
    trigger: CaptureTrigger,
    config: &Config,
    graph: &dyn GraphApi,
) -> SdkResult<CaptureOutcome> {
    if !trigger.is_enabled(config) {
        return Ok(CaptureOutcome::Skipped(CaptureSkip::Disabled));
    }

    let minimum = trigger.min_turns();
    if turns.len() < minimum {
        debug!(%trigger, count = turns.len(), minimum, "Capture skipped, too few turns");
        return Ok(CaptureOutcome::Skipped(CaptureSkip::TooFewTurns {
            count: turns.len(),
            minimum,
        }));
    }

    if !HealthGate::new(graph).check("capture").await {
        return Ok(CaptureOutcome::Skipped(CaptureSkip::Unhealthy));
    }

    let draft = match build_episode(turns, trigger, config) {
        Ok(draft) => draft,
        Err(skip) => {
            debug!(%trigger, reason = %skip, "Capture skipped");
            return Ok(CaptureOutcome::Skipped(skip));
        }
    };

    let message = episode_message(&draft, trigger, now_utc());
    let result = graph.ingest(std::slice::from_ref(&message)).await?;
    let chars = draft.body.chars().count();
    info!(
        %trigger,
        lines = draft.lines,
        chars,
        group_id = graph.group_id(),
        "Submitted conversation episode"
    );

    Ok(CaptureOutcome::Submitted {
        lines: draft.lines,
        chars,
        result,
    })
}

/// Contained capture: `None` when anything failed.
pub async fn capture(
    turns: &[Turn],
    trigger: CaptureTrigger,
    config: &Config,
    graph: &dyn GraphApi,
) -> Option<CaptureOutcome> {
    contain("capture", run_capture(turns, trigger, config, graph)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentBlock, TurnContent};
    use crate::testing::StubGraph;
    use chrono::TimeZone;

    fn conversation(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("question number {i} about billing"))
                } else {
                    Turn::assistant(format!("answer number {i} about billing"))
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_compaction_submits_one_episode() {
        let config = Config::default();
        let graph = StubGraph::healthy();
        let turns = conversation(4);

        let outcome = capture(&turns, CaptureTrigger::Compaction, &config, &graph)
            .await
            .unwrap();
        assert!(outcome.is_submitted());

        let ingests = graph.ingests();
        assert_eq!(ingests.len(), 1);
        assert_eq!(ingests[0].len(), 1);

        let message = &ingests[0][0];
        assert_eq!(
            message.content,
            "user: question number 0 about billing\n\n\
             assistant: answer number 1 about billing\n\n\
             user: question number 2 about billing\n\n\
             assistant: answer number 3 about billing"
        );
        assert_eq!(message.role_type, RoleType::User);
        assert_eq!(message.role, "conversation");
        assert_eq!(
            message.source_description.as_deref(),
            Some("pre-compaction conversation")
        );
        assert!(message.name.as_deref().unwrap().starts_with("pre-compaction-"));
        assert!(message.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_too_few_turns_makes_no_calls() {
        let config = Config::default();
        let graph = StubGraph::healthy();

        let outcome = capture(&conversation(2), CaptureTrigger::Compaction, &config, &graph)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CaptureOutcome::Skipped(CaptureSkip::TooFewTurns {
                count: 2,
                minimum: 4
            })
        );
        assert!(graph.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_keeps_last_twenty_lines() {
        let config = Config::default();
        let graph = StubGraph::healthy();

        capture(&conversation(25), CaptureTrigger::Reset, &config, &graph)
            .await
            .unwrap();

        let message = &graph.ingests()[0][0];
        let lines: Vec<&str> = message.content.split("\n\n").collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "assistant: answer number 5 about billing");
        assert_eq!(lines[19], "user: question number 24 about billing");
        assert_eq!(message.source_description.as_deref(), Some("session reset"));
    }

    #[tokio::test]
    async fn test_unhealthy_makes_no_ingest() {
        let config = Config::default();
        let graph = StubGraph::unhealthy();

        let outcome = capture(&conversation(6), CaptureTrigger::Reset, &config, &graph)
            .await
            .unwrap();
        assert_eq!(outcome, CaptureOutcome::Skipped(CaptureSkip::Unhealthy));
        assert!(graph.ingests().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_triggers() {
        let mut config = Config::default();
        let graph = StubGraph::healthy();
        let turns = conversation(4);

        // turn-end capture is off by default
        assert_eq!(
            run_capture(&turns, CaptureTrigger::TurnEnd, &config, &graph)
                .await
                .unwrap(),
            CaptureOutcome::Skipped(CaptureSkip::Disabled)
        );

        config.capture.enabled = false;
        config.capture.on_turn_end = true;
        assert_eq!(
            run_capture(&turns, CaptureTrigger::Compaction, &config, &graph)
                .await
                .unwrap(),
            CaptureOutcome::Skipped(CaptureSkip::Disabled)
        );
        assert!(
            run_capture(&turns, CaptureTrigger::TurnEnd, &config, &graph)
                .await
                .unwrap()
                .is_submitted()
        );

        let message = &graph.ingests()[0][0];
        assert_eq!(
            message.content,
            "user: question number 2 about billing\n\nassistant: answer number 3 about billing"
        );
        assert_eq!(message.source_description.as_deref(), Some("completed turn"));
    }

    #[test]
    fn test_per_turn_caps() {
        let config = Config::default();
        let long = "x".repeat(5000);
        let turns = vec![
            Turn::user(long.clone()),
            Turn::assistant(long.clone()),
            Turn::user(long.clone()),
            Turn::assistant(long),
        ];

        let draft = build_episode(&turns, CaptureTrigger::Compaction, &config).unwrap();
        let first = draft.body.split("\n\n").next().unwrap();
        assert_eq!(first.chars().count(), "user: ".len() + 2000);

        let draft = build_episode(&turns, CaptureTrigger::Reset, &config).unwrap();
        let first = draft.body.split("\n\n").next().unwrap();
        assert_eq!(first.chars().count(), "user: ".len() + 1000);
    }

    #[test]
    fn test_episode_body_is_capped() {
        let config = Config::default();
        let turns: Vec<Turn> = (0..10).map(|_| Turn::user("y".repeat(1900))).collect();

        let draft = build_episode(&turns, CaptureTrigger::Compaction, &config).unwrap();
        assert_eq!(draft.body.chars().count(), 12000);
        assert_eq!(draft.lines, 10);
    }

    #[test]
    fn test_block_content_contributes_text_only() {
        let config = Config::default();
        let turns = vec![
            Turn::user("what is in the logs?"),
            Turn {
                role: "assistant".into(),
                content: TurnContent::Blocks(vec![
                    ContentBlock::text("Looking now."),
                    ContentBlock {
                        kind: "tool_use".into(),
                        text: None,
                    },
                    ContentBlock::text("Found a timeout."),
                ]),
            },
        ];

        let draft = build_episode(&turns, CaptureTrigger::TurnEnd, &config).unwrap();
        assert_eq!(
            draft.body,
            "user: what is in the logs?\n\nassistant: Looking now.\nFound a timeout."
        );
    }

    #[test]
    fn test_markers_and_acknowledgements_are_dropped() {
        let config = Config::default();
        let turns = vec![
            Turn::user("HEARTBEAT_OK"),
            Turn::assistant("NO_REPLY"),
            Turn::user("Thanks!"),
            Turn::assistant("ok."),
            Turn::user("deploy the billing service to staging"),
        ];

        assert_eq!(
            build_episode(&turns, CaptureTrigger::Compaction, &config),
            Err(CaptureSkip::TooFewLines { count: 1 })
        );

        let mut config = Config::default();
        config.filters.acknowledgements.clear();
        let draft = build_episode(&turns, CaptureTrigger::Compaction, &config).unwrap();
        assert_eq!(draft.lines, 3);
    }

    #[tokio::test]
    async fn test_too_few_lines_after_health_check() {
        let config = Config::default();
        let graph = StubGraph::healthy();
        let turns = vec![
            Turn::new("system", "a"),
            Turn::new("tool", "b"),
            Turn::user("only one real line"),
            Turn::assistant("   "),
        ];

        let outcome = capture(&turns, CaptureTrigger::Compaction, &config, &graph)
            .await
            .unwrap();
        assert_eq!(outcome, CaptureOutcome::Skipped(CaptureSkip::TooFewLines { count: 1 }));
        assert!(graph.ingests().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_failure_is_contained() {
        let config = Config::default();
        let graph = StubGraph::healthy().failing(422);

        assert!(
            run_capture(&conversation(4), CaptureTrigger::Compaction, &config, &graph)
                .await
                .is_err()
        );
        assert_eq!(
            capture(&conversation(4), CaptureTrigger::Compaction, &config, &graph).await,
            None
        );
    }

    #[test]
    fn test_episode_message_fields() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let draft = EpisodeDraft {
            body: "user: a\n\nassistant: b".into(),
            lines: 2,
        };

        let message = episode_message(&draft, CaptureTrigger::Reset, now);
        assert_eq!(
            message.name.as_deref(),
            Some(format!("session-reset-{}", now.timestamp_millis()).as_str())
        );
        assert_eq!(message.timestamp.as_deref(), Some("2026-03-01T12:00:00+00:00"));
        assert_eq!(message.role, CAPTURE_ROLE);
    }

    #[test]
    fn test_trigger_parsing() {
        assert_eq!(
            "compaction".parse::<CaptureTrigger>().unwrap(),
            CaptureTrigger::Compaction
        );
        assert_eq!(
            "turn-end".parse::<CaptureTrigger>().unwrap(),
            CaptureTrigger::TurnEnd
        );
        assert!("sometimes".parse::<CaptureTrigger>().is_err());
        assert_eq!(CaptureTrigger::TurnEnd.to_string(), "turn_end");
    }
}
