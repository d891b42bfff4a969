//! In-memory `GraphApi` used by pipeline, hook and tool tests.

use async_trait::async_trait;
use graphmem_core::{Episode, Error, Fact, GraphApi, IngestResult, Message, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Health,
    Search { query: String, max_facts: usize },
    Ingest(Vec<Message>),
    GetMemory { messages: Vec<Message>, max_facts: usize },
    Episodes { last_n: usize },
}

pub struct StubGraph {
    up: AtomicBool,
    facts: Vec<Fact>,
    episodes: Vec<Episode>,
    fail_status: Option<u16>,
    calls: Mutex<Vec<Call>>,
}

impl StubGraph {
    pub fn healthy() -> Self {
        Self {
            up: AtomicBool::new(true),
            facts: Vec::new(),
            episodes: Vec::new(),
            fail_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unhealthy() -> Self {
        let stub = Self::healthy();
        stub.up.store(false, Ordering::SeqCst);
        stub
    }

    pub fn with_facts(mut self, facts: Vec<Fact>) -> Self {
        self.facts = facts;
        self
    }

    pub fn with_episodes(mut self, episodes: Vec<Episode>) -> Self {
        self.episodes = episodes;
        self
    }

    /// Make search, ingest and get-memory fail with a remote error.
    pub fn failing(mut self, status: u16) -> Self {
        self.fail_status = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<(String, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Search { query, max_facts } => Some((query, max_facts)),
                _ => None,
            })
            .collect()
    }

    pub fn ingests(&self) -> Vec<Vec<Message>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Ingest(messages) => Some(messages),
                _ => None,
            })
            .collect()
    }

    /// Every call other than the health check.
    pub fn remote_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c != Call::Health).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail(&self) -> Result<()> {
        match self.fail_status {
            Some(status) => Err(Error::remote(status, "stub failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GraphApi for StubGraph {
    fn group_id(&self) -> &str {
        "test-group"
    }

    async fn healthy(&self) -> bool {
        self.record(Call::Health);
        self.up.load(Ordering::SeqCst)
    }

    async fn search(&self, query: &str, max_facts: usize) -> Result<Vec<Fact>> {
        self.record(Call::Search {
            query: query.to_string(),
            max_facts,
        });
        self.fail()?;
        Ok(self.facts.iter().take(max_facts).cloned().collect())
    }

    async fn ingest(&self, messages: &[Message]) -> Result<IngestResult> {
        self.record(Call::Ingest(messages.to_vec()));
        self.fail()?;
        Ok(IngestResult {
            success: true,
            message: "Messages added to processing queue".into(),
        })
    }

    async fn get_memory(&self, messages: &[Message], max_facts: usize) -> Result<Vec<Fact>> {
        self.record(Call::GetMemory {
            messages: messages.to_vec(),
            max_facts,
        });
        self.fail()?;
        Ok(self.facts.iter().take(max_facts).cloned().collect())
    }

    async fn episodes(&self, last_n: usize) -> Vec<Episode> {
        self.record(Call::Episodes { last_n });
        if self.fail_status.is_some() {
            return Vec::new();
        }
        self.episodes.iter().take(last_n).cloned().collect()
    }
}

pub fn fact(name: &str, fact: &str) -> Fact {
    Fact {
        uuid: format!("uuid-{name}"),
        name: name.to_string(),
        fact: fact.to_string(),
        valid_at: None,
        invalid_at: None,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        expired_at: None,
    }
}

pub fn episode(name: &str, content: &str) -> Episode {
    serde_json::from_value(serde_json::json!({
        "uuid": format!("ep-{name}"),
        "name": name,
        "group_id": "test-group",
        "content": content,
        "created_at": "2026-01-01T00:00:00Z",
    }))
    .unwrap()
}
