//! Knowledge graph data model.
//!
//! Facts and episodes are owned by the remote service and only ever
//! deserialized here. Messages are built locally for a single ingest call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::parse_datetime;

// ─────────────────────────────────────────────────────────────────────────────
// Facts & Episodes
// ─────────────────────────────────────────────────────────────────────────────

/// A relationship extracted by the service, with its validity interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub uuid: String,
    pub name: String,
    /// Natural-language statement of the relationship
    pub fact: String,
    #[serde(default)]
    pub valid_at: Option<String>,
    #[serde(default)]
    pub invalid_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub expired_at: Option<String>,
}

impl Fact {
    /// When the fact became true, if known
    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.valid_at.as_deref().and_then(parse_datetime)
    }

    /// When the fact stopped being true, if it has
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.invalid_at.as_deref().and_then(parse_datetime)
    }

    /// Whether the service has marked this fact invalid or expired
    pub fn is_current(&self) -> bool {
        self.invalid_at.is_none() && self.expired_at.is_none()
    }
}

/// One unit of raw content the service has stored or queued for extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub valid_at: String,
    /// UUIDs of the facts extracted from this episode
    #[serde(default)]
    pub entity_edges: Vec<String>,
}

impl Episode {
    /// Creation time, if the service sent a parsable timestamp
    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_datetime(&self.created_at)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Speaker category understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    User,
    Assistant,
    System,
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleType::User => write!(f, "user"),
            RoleType::Assistant => write!(f, "assistant"),
            RoleType::System => write!(f, "system"),
        }
    }
}

/// A message submitted for extraction.
///
/// `role` has no server-side default; an empty role is rejected by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub role_type: RoleType,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_description: Option<String>,
}

impl Message {
    /// Create a message with the required fields
    pub fn new(role_type: RoleType, role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role_type,
            role: role.into(),
            name: None,
            timestamp: None,
            source_description: None,
        }
    }

    /// Set the episode name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set an ISO-8601 timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Set the source description
    pub fn with_source_description(mut self, description: impl Into<String>) -> Self {
        self.source_description = Some(description.into());
        self
    }
}

/// Outcome of an ingest call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub success: bool,
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// POST /search body
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub group_ids: Vec<&'a str>,
    pub max_facts: usize,
}

/// POST /get-memory body
#[derive(Debug, Serialize)]
pub struct GetMemoryRequest<'a> {
    pub group_id: &'a str,
    pub center_node_uuid: Option<&'a str>,
    pub messages: &'a [Message],
    pub max_facts: usize,
}

/// POST /messages body
#[derive(Debug, Serialize)]
pub struct AddMessagesRequest<'a> {
    pub group_id: &'a str,
    pub messages: &'a [Message],
}

/// Response of /search and /get-memory
#[derive(Debug, Default, Deserialize)]
pub struct FactsResponse {
    #[serde(default)]
    pub facts: Option<Vec<Fact>>,
}
