//! On-demand knowledge graph tools.
//!
//! - graph_search: Search facts
//! - graph_ingest: Submit content as an episode
//! - graph_status: Service health and recent episodes
//!
//! Tools skip the health gate and never swallow failures: an error becomes
//! the tool's text so the user sees it.

use graphmem_core::time::{format_datetime, now_utc};
use graphmem_core::{GraphApi, Message, RoleType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};

pub const SEARCH_TOOL: &str = "graph_search";
pub const INGEST_TOOL: &str = "graph_ingest";
pub const STATUS_TOOL: &str = "graph_status";

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_STATUS_EPISODES: usize = 5;
const DEFAULT_INGEST_SOURCE: &str = "manual ingest";
const EPISODE_PREVIEW_CHARS: usize = 80;

/// Arguments of `graph_search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Arguments of `graph_ingest`
#[derive(Debug, Clone, Deserialize)]
pub struct IngestArgs {
    pub content: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Arguments of `graph_status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusArgs {
    #[serde(default)]
    pub last_n: Option<usize>,
}

/// Tool result shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub text: String,
    pub success: bool,
    pub details: Value,
}

impl ToolOutput {
    fn ok(text: impl Into<String>, details: Value) -> Self {
        Self {
            text: text.into(),
            success: true,
            details,
        }
    }

    fn failed(text: impl Into<String>, error: impl ToString) -> Self {
        Self {
            text: text.into(),
            success: false,
            details: json!({"error": error.to_string()}),
        }
    }
}

/// Tool metadata for host registration.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Definitions of all tools.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SEARCH_TOOL,
            description: "Search the knowledge graph for facts relevant to a query.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Maximum facts to return (default 10)"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: INGEST_TOOL,
            description: "Store content in the knowledge graph as a new episode.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Text to remember"
                    },
                    "name": {
                        "type": "string",
                        "description": "Optional episode name"
                    },
                    "source": {
                        "type": "string",
                        "description": "Optional description of where the content came from"
                    }
                },
                "required": ["content"]
            }),
        },
        ToolDefinition {
            name: STATUS_TOOL,
            description: "Check knowledge graph health and list the most recent episodes.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "last_n": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of recent episodes to list (default 5)"
                    }
                }
            }),
        },
    ]
}

/// Dispatch a tool call by name with raw JSON arguments.
///
/// Only an unknown tool name is an error; arguments that do not fit the
/// tool's schema come back as a failed [`ToolOutput`] like any other failure.
pub async fn invoke(graph: &dyn GraphApi, name: &str, args: Value) -> SdkResult<ToolOutput> {
    debug!(tool = name, "Invoking tool");
    let output = match name {
        SEARCH_TOOL => match decode_args(name, args) {
            Ok(args) => search_tool(graph, args).await,
            Err(output) => output,
        },
        INGEST_TOOL => match decode_args(name, args) {
            Ok(args) => ingest_tool(graph, args).await,
            Err(output) => output,
        },
        STATUS_TOOL => {
            let args = if args.is_null() {
                Ok(StatusArgs::default())
            } else {
                decode_args(name, args)
            };
            match args {
                Ok(args) => status_tool(graph, args).await,
                Err(output) => output,
            }
        }
        other => return Err(SdkError::invalid_input(format!("unknown tool '{other}'"))),
    };
    Ok(output)
}

fn decode_args<T: DeserializeOwned>(name: &str, args: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(args).map_err(|e| {
        debug!(tool = name, error = %e, "Rejected tool arguments");
        ToolOutput::failed(format!("Invalid arguments for {name}: {e}"), e)
    })
}

/// `graph_search`
pub async fn search_tool(graph: &dyn GraphApi, args: SearchArgs) -> ToolOutput {
    let limit = args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1);
    match graph.search(&args.query, limit).await {
        Ok(facts) if facts.is_empty() => {
            ToolOutput::ok("No relevant facts found.", json!({"count": 0, "facts": []}))
        }
        Ok(facts) => {
            let text = facts
                .iter()
                .map(|f| format!("- **{}**: {}", f.name, f.fact))
                .collect::<Vec<_>>()
                .join("\n");
            ToolOutput::ok(text, json!({"count": facts.len(), "facts": facts}))
        }
        Err(e) => ToolOutput::failed(format!("Knowledge graph search failed: {e}"), e),
    }
}

/// `graph_ingest`
pub async fn ingest_tool(graph: &dyn GraphApi, args: IngestArgs) -> ToolOutput {
    let content = args.content.trim();
    if content.is_empty() {
        return ToolOutput::failed("Nothing to ingest: content is empty.", "content is required");
    }

    let now = now_utc();
    let name = args
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("manual-{}", now.timestamp_millis()));
    let source = args
        .source
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_INGEST_SOURCE.to_string());

    let message = Message::new(RoleType::User, "user", content)
        .with_name(name.clone())
        .with_timestamp(format_datetime(&now))
        .with_source_description(source);

    match graph.ingest(std::slice::from_ref(&message)).await {
        Ok(result) => {
            info!(name = %name, chars = content.chars().count(), "Ingested content");
            ToolOutput::ok(
                format!("Queued episode '{name}' for extraction."),
                json!({"name": name, "success": result.success, "message": result.message}),
            )
        }
        Err(e) => ToolOutput::failed(format!("Knowledge graph ingest failed: {e}"), e),
    }
}

/// `graph_status`
pub async fn status_tool(graph: &dyn GraphApi, args: StatusArgs) -> ToolOutput {
    let last_n = args.last_n.unwrap_or(DEFAULT_STATUS_EPISODES).max(1);
    let healthy = graph.healthy().await;
    let group_id = graph.group_id();

    if !healthy {
        return ToolOutput {
            text: format!("Knowledge graph is unavailable (group '{group_id}')."),
            success: false,
            details: json!({"healthy": false, "group_id": group_id, "episodes": []}),
        };
    }

    let episodes = graph.episodes(last_n).await;
    let mut lines = vec![format!(
        "Knowledge graph is healthy (group '{group_id}'), {} recent episode(s).",
        episodes.len()
    )];
    lines.extend(episodes.iter().map(|ep| {
        let preview: String = ep.content.chars().take(EPISODE_PREVIEW_CHARS).collect();
        format!("- {} [{}]: {}", ep.name, ep.created_at, preview.replace('\n', " "))
    }));

    ToolOutput::ok(
        lines.join("\n"),
        json!({"healthy": true, "group_id": group_id, "episodes": episodes}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubGraph, episode, fact};

    #[tokio::test]
    async fn test_search_lists_facts() {
        let graph = StubGraph::healthy().with_facts(vec![
            fact("USES", "billing uses Postgres"),
            fact("OWNS", "Ana owns billing"),
        ]);

        let output = invoke(&graph, SEARCH_TOOL, json!({"query": "billing"}))
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(
            output.text,
            "- **USES**: billing uses Postgres\n- **OWNS**: Ana owns billing"
        );
        assert_eq!(output.details["count"], 2);
        assert_eq!(graph.searches(), vec![("billing".to_string(), 10)]);
    }

    #[tokio::test]
    async fn test_search_empty_and_failure() {
        let graph = StubGraph::healthy();
        let output = search_tool(
            &graph,
            SearchArgs {
                query: "nothing".into(),
                limit: Some(3),
            },
        )
        .await;
        assert_eq!(output.text, "No relevant facts found.");
        assert_eq!(graph.searches(), vec![("nothing".to_string(), 3)]);

        let graph = StubGraph::healthy().failing(500);
        let output = search_tool(
            &graph,
            SearchArgs {
                query: "boom".into(),
                limit: None,
            },
        )
        .await;
        assert!(!output.success);
        assert!(output.text.starts_with("Knowledge graph search failed:"));
        assert!(output.text.contains("500"));
    }

    #[tokio::test]
    async fn test_tools_skip_health_gate() {
        let graph = StubGraph::unhealthy();
        search_tool(
            &graph,
            SearchArgs {
                query: "anything".into(),
                limit: None,
            },
        )
        .await;
        assert_eq!(graph.searches().len(), 1);
        assert_eq!(graph.remote_calls(), 1);
        assert_eq!(graph.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_builds_manual_message() {
        let graph = StubGraph::healthy();

        let output = invoke(
            &graph,
            INGEST_TOOL,
            json!({"content": "  The billing service moved to Postgres 16.  "}),
        )
        .await
        .unwrap();
        assert!(output.success);

        let ingests = graph.ingests();
        assert_eq!(ingests.len(), 1);
        let message = &ingests[0][0];
        assert_eq!(message.content, "The billing service moved to Postgres 16.");
        assert_eq!(message.role_type, RoleType::User);
        assert_eq!(message.role, "user");
        assert!(message.name.as_deref().unwrap().starts_with("manual-"));
        assert_eq!(message.source_description.as_deref(), Some("manual ingest"));
        assert!(message.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_ingest_custom_name_and_source() {
        let graph = StubGraph::healthy();
        ingest_tool(
            &graph,
            IngestArgs {
                content: "ADR-12 accepted".into(),
                name: Some("adr-12".into()),
                source: Some("architecture review".into()),
            },
        )
        .await;

        let message = &graph.ingests()[0][0];
        assert_eq!(message.name.as_deref(), Some("adr-12"));
        assert_eq!(
            message.source_description.as_deref(),
            Some("architecture review")
        );
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_and_reports_failure() {
        let graph = StubGraph::healthy();
        let output = ingest_tool(
            &graph,
            IngestArgs {
                content: "   ".into(),
                name: None,
                source: None,
            },
        )
        .await;
        assert!(!output.success);
        assert!(graph.calls().is_empty());

        let graph = StubGraph::healthy().failing(422);
        let output = ingest_tool(
            &graph,
            IngestArgs {
                content: "something".into(),
                name: None,
                source: None,
            },
        )
        .await;
        assert!(!output.success);
        assert!(output.text.starts_with("Knowledge graph ingest failed:"));
    }

    #[tokio::test]
    async fn test_status_reports_health_and_episodes() {
        let graph = StubGraph::healthy().with_episodes(vec![
            episode("pre-compaction-1", "user: hi\n\nassistant: hello"),
            episode("manual-2", "note"),
        ]);

        let output = invoke(&graph, STATUS_TOOL, Value::Null).await.unwrap();
        assert!(output.success);
        assert!(output.text.contains("healthy"));
        assert!(output.text.contains("- pre-compaction-1 [2026-01-01T00:00:00Z]: user: hi  assistant: hello"));
        assert_eq!(output.details["episodes"].as_array().unwrap().len(), 2);

        let graph = StubGraph::unhealthy();
        let output = status_tool(&graph, StatusArgs { last_n: Some(3) }).await;
        assert!(!output.success);
        assert!(output.text.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_bad_input() {
        let graph = StubGraph::healthy();
        assert!(invoke(&graph, "graph_delete", json!({})).await.is_err());

        let output = invoke(&graph, SEARCH_TOOL, json!({"limit": 3})).await.unwrap();
        assert!(!output.success);
        assert!(output.text.starts_with("Invalid arguments for graph_search:"));
        assert!(output.text.contains("query"));

        let output = invoke(&graph, INGEST_TOOL, json!({"content": 42})).await.unwrap();
        assert!(!output.success);
        assert!(output.details["error"].is_string());

        let output = invoke(&graph, STATUS_TOOL, json!({"last_n": "many"}))
            .await
            .unwrap();
        assert!(!output.success);
        assert!(graph.calls().is_empty());
    }

    #[test]
    fn test_definitions() {
        let names: Vec<&str> = definitions().iter().map(|d| d.name).collect();
        assert_eq!(names, vec![SEARCH_TOOL, INGEST_TOOL, STATUS_TOOL]);
        assert_eq!(definitions()[0].input_schema["required"][0], "query");
    }
}
