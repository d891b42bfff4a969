//! Conversation content as delivered by the host.
//!
//! A turn's content is either plain text or a list of typed blocks; only
//! `text` blocks carry conversational text. [`normalize_turns`] flattens both
//! shapes into `(speaker, text)` pairs used by every pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One conversational turn from a host payload.
///
/// A missing role or null content decodes to empty values, so one odd turn
/// is dropped by [`normalize_turns`] instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: TurnContent,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<TurnContent, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TurnContent>::deserialize(deserializer)?.unwrap_or_default())
}

impl Turn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: TurnContent::PlainText(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Turn content: a plain string or a sequence of typed blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    PlainText(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for TurnContent {
    fn default() -> Self {
        TurnContent::PlainText(String::new())
    }
}

impl TurnContent {
    /// Conversational text; text blocks are joined with newlines, other
    /// block kinds are ignored.
    pub fn text(&self) -> String {
        match self {
            TurnContent::PlainText(text) => text.clone(),
            TurnContent::Blocks(blocks) => blocks
                .iter()
                .filter(|b| b.kind == "text")
                .filter_map(|b| b.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A typed content block (`text`, `tool_use`, `image`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Speakers whose turns are worth remembering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    fn from_role(role: &str) -> Option<Self> {
        match role.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Speaker::User),
            "assistant" => Some(Speaker::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Assistant => write!(f, "assistant"),
        }
    }
}

/// A turn reduced to its speaker and trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Flatten host turns to user/assistant text, dropping empty and
/// non-conversational turns.
pub fn normalize_turns(turns: &[Turn]) -> Vec<TextTurn> {
    turns
        .iter()
        .filter_map(|turn| {
            let speaker = Speaker::from_role(&turn.role)?;
            let text = turn.content.text().trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TextTurn { speaker, text })
        })
        .collect()
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
