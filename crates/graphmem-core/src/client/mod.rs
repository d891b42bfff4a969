//! HTTP client for the temporal knowledge-graph service.
//!
//! Every call is bounded by its own timeout; a timed-out call is reported
//! exactly like a connection failure. Health and episode listing are advisory
//! and never fail, while search, ingest and get-memory propagate errors.
//!
//! # Usage
//!
//! ```rust,no_run
//! use graphmem_core::{Config, GraphApi, GraphClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let client = GraphClient::from_config(&config.server)?;
//!     if client.healthy().await {
//!         let facts = client.search("where does Alice work?", 5).await?;
//!         println!("{} facts", facts.len());
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::types::*;

/// Operations the pipelines need from the knowledge graph.
///
/// Implemented by [`GraphClient`]; tests substitute in-memory doubles.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Group namespace every operation is scoped to.
    fn group_id(&self) -> &str;

    /// `true` only when the service answers the health check with 2xx.
    async fn healthy(&self) -> bool;

    /// Search facts relevant to `query`.
    async fn search(&self, query: &str, max_facts: usize) -> Result<Vec<Fact>>;

    /// Submit messages for asynchronous extraction.
    async fn ingest(&self, messages: &[Message]) -> Result<IngestResult>;

    /// Retrieve facts relevant to a set of messages.
    async fn get_memory(&self, messages: &[Message], max_facts: usize) -> Result<Vec<Fact>>;

    /// Most recent episodes; empty on any failure.
    async fn episodes(&self, last_n: usize) -> Vec<Episode>;
}

/// Per-operation request timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub health: Duration,
    pub request: Duration,
    pub episodes: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(5),
            request: Duration::from_secs(15),
            episodes: Duration::from_secs(10),
        }
    }
}

impl From<&ServerConfig> for Timeouts {
    fn from(server: &ServerConfig) -> Self {
        Self {
            health: server.health_timeout(),
            request: server.request_timeout(),
            episodes: server.episodes_timeout(),
        }
    }
}

/// Knowledge graph HTTP client
#[derive(Clone)]
pub struct GraphClient {
    /// Base URL of the service
    base_url: Url,
    /// Bearer token for authentication
    token: Option<String>,
    /// Group namespace
    group_id: String,
    /// Request timeouts
    timeouts: Timeouts,
    /// HTTP client
    client: reqwest::Client,
}

impl GraphClient {
    /// Create a client for `base_url` scoped to `group_id`
    pub fn new(base_url: &str, group_id: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| Error::Config(format!("Invalid server URL {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Server URL cannot be a base: {}", base_url)));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token: None,
            group_id: group_id.into(),
            timeouts: Timeouts::default(),
            client,
        })
    }

    /// Create a client from the `[server]` configuration section
    pub fn from_config(server: &ServerConfig) -> Result<Self> {
        Ok(Self::new(&server.url, server.group_id.clone())?
            .with_token(server.token.clone())
            .with_timeouts(Timeouts::from(server)))
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Override request timeouts
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Base URL the client talks to
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve path segments against the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Build request with auth header.
    fn request(&self, method: Method, url: Url, timeout: Duration) -> RequestBuilder {
        debug!("Graph request: {} {}", method, url);
        let mut req = self.client.request(method, url).timeout(timeout);

        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }

        req
    }

    /// POST a JSON body and fail on any non-2xx status.
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint(segments);
        let resp = self
            .request(Method::POST, url, self.timeouts.request)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let error_text = resp.text().await.unwrap_or_default();
            Err(Error::remote(status.as_u16(), error_text))
        }
    }

    async fn read_facts(resp: reqwest::Response) -> Result<Vec<Fact>> {
        let parsed: FactsResponse = resp.json().await?;
        Ok(parsed.facts.unwrap_or_default())
    }
}

/// Reject messages that would rely on a server-side default role.
fn validate_messages(messages: &[Message]) -> Result<()> {
    if let Some(index) = messages.iter().position(|m| m.role.trim().is_empty()) {
        return Err(Error::InvalidMessage(format!(
            "message {} has an empty role",
            index
        )));
    }
    Ok(())
}

#[async_trait]
impl GraphApi for GraphClient {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn healthy(&self) -> bool {
        let url = self.endpoint(&["healthcheck"]);
        match self
            .request(Method::GET, url, self.timeouts.health)
            .send()
            .await
        {
            Ok(resp) => {
                let ok = resp.status().is_success();
                if !ok {
                    debug!("Health check returned {}", resp.status());
                }
                ok
            }
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }

    async fn search(&self, query: &str, max_facts: usize) -> Result<Vec<Fact>> {
        let body = SearchRequest {
            query,
            group_ids: vec![self.group_id.as_str()],
            max_facts,
        };
        let resp = self.post_json(&["search"], &body).await?;
        Self::read_facts(resp).await
    }

    async fn ingest(&self, messages: &[Message]) -> Result<IngestResult> {
        validate_messages(messages)?;

        let body = AddMessagesRequest {
            group_id: &self.group_id,
            messages,
        };
        let resp = self.post_json(&["messages"], &body).await?;
        let status = resp.status();

        // Status decides success; the body only supplies the message.
        let parsed = match resp.text().await {
            Ok(text) => serde_json::from_str::<IngestResult>(&text).ok(),
            Err(e) => {
                debug!(
                    status = status.as_u16(),
                    error = %e,
                    "Could not read ingest response body"
                );
                None
            }
        };
        let message = match parsed {
            Some(parsed) => parsed.message,
            None => format!("Accepted ({})", status.as_u16()),
        };

        Ok(IngestResult {
            success: true,
            message,
        })
    }

    async fn get_memory(&self, messages: &[Message], max_facts: usize) -> Result<Vec<Fact>> {
        validate_messages(messages)?;

        let body = GetMemoryRequest {
            group_id: &self.group_id,
            center_node_uuid: None,
            messages,
            max_facts,
        };
        let resp = self.post_json(&["get-memory"], &body).await?;
        Self::read_facts(resp).await
    }

    async fn episodes(&self, last_n: usize) -> Vec<Episode> {
        let mut url = self.endpoint(&["episodes", self.group_id.as_str()]);
        url.query_pairs_mut()
            .append_pair("last_n", &last_n.to_string());

        let resp = match self
            .request(Method::GET, url, self.timeouts.episodes)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Episode listing failed: {}", e);
                return Vec::new();
            }
        };

        if !resp.status().is_success() {
            warn!("Episode listing returned {}", resp.status());
            return Vec::new();
        }

        match resp.json::<Vec<Episode>>().await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!("Episode listing had unexpected shape: {}", e);
                Vec::new()
            }
        }
    }
}
