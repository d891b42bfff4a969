//! Memory plugin: configuration plus a graph handle, wired to lifecycle hooks.

use async_trait::async_trait;
use graphmem_core::{Config, GraphApi, GraphClient};
use std::sync::Arc;
use tracing::{debug, info};

use crate::capture::{self, CaptureOutcome, CaptureTrigger};
use crate::content::Turn;
use crate::error::SdkResult;
use crate::hooks::{Hook, HookEvent, HookPhase, HookRegistry, HookResult};
use crate::recall;

pub const RECALL_HOOK: &str = "graphmem.recall";
pub const COMPACTION_HOOK: &str = "graphmem.capture.compaction";
pub const RESET_HOOK: &str = "graphmem.capture.reset";
pub const TURN_END_HOOK: &str = "graphmem.capture.turn_end";

/// Long-term memory for one agent host.
///
/// Holds the immutable configuration and the graph client shared by every
/// handler. Handlers never return errors; failures are contained and logged.
pub struct MemoryPlugin {
    config: Arc<Config>,
    graph: Arc<dyn GraphApi>,
}

impl MemoryPlugin {
    pub fn new(config: Config, graph: Arc<dyn GraphApi>) -> Self {
        Self {
            config: Arc::new(config),
            graph,
        }
    }

    /// Validate `config` and connect an HTTP client to the configured service.
    pub fn from_config(config: Config) -> SdkResult<Self> {
        config
            .validate()
            .map_err(graphmem_core::Error::from)?;
        let client = GraphClient::from_config(&config.server)?;
        info!(
            url = %client.base_url(),
            group_id = %config.server.group_id,
            "Memory plugin ready"
        );
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graph(&self) -> &dyn GraphApi {
        self.graph.as_ref()
    }

    /// Context block to prepend before the agent runs, if any.
    pub async fn on_before_agent_start(&self, prompt: Option<&str>) -> Option<String> {
        recall::recall(prompt, &self.config, self.graph.as_ref()).await
    }

    pub async fn on_before_compaction(&self, messages: &[Turn]) -> Option<CaptureOutcome> {
        capture::capture(messages, CaptureTrigger::Compaction, &self.config, self.graph.as_ref())
            .await
    }

    pub async fn on_before_reset(&self, messages: &[Turn]) -> Option<CaptureOutcome> {
        capture::capture(messages, CaptureTrigger::Reset, &self.config, self.graph.as_ref()).await
    }

    /// Capture the finished turn; failed turns are never captured.
    pub async fn on_agent_end(&self, success: bool, messages: &[Turn]) -> Option<CaptureOutcome> {
        if !success {
            debug!("Turn did not succeed, skipping turn-end capture");
            return None;
        }
        capture::capture(messages, CaptureTrigger::TurnEnd, &self.config, self.graph.as_ref()).await
    }

    /// Install the recall hook and the three capture hooks.
    pub async fn register_hooks(self: &Arc<Self>, registry: &HookRegistry) {
        registry
            .register(Arc::new(RecallHook {
                plugin: Arc::clone(self),
            }))
            .await;
        for (name, phase) in [
            (COMPACTION_HOOK, HookPhase::BeforeCompaction),
            (RESET_HOOK, HookPhase::BeforeReset),
            (TURN_END_HOOK, HookPhase::AgentEnd),
        ] {
            registry
                .register(Arc::new(CaptureHook {
                    name,
                    phase,
                    plugin: Arc::clone(self),
                }))
                .await;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hooks
// ─────────────────────────────────────────────────────────────────────────────

struct RecallHook {
    plugin: Arc<MemoryPlugin>,
}

#[async_trait]
impl Hook for RecallHook {
    fn name(&self) -> &str {
        RECALL_HOOK
    }

    fn phase(&self) -> HookPhase {
        HookPhase::BeforeAgentStart
    }

    async fn execute(&self, event: &HookEvent) -> HookResult {
        let HookEvent::BeforeAgentStart(start) = event else {
            return HookResult::Continue;
        };
        match self.plugin.on_before_agent_start(start.prompt.as_deref()).await {
            Some(context) => HookResult::PrependContext(context),
            None => HookResult::Continue,
        }
    }
}

struct CaptureHook {
    name: &'static str,
    phase: HookPhase,
    plugin: Arc<MemoryPlugin>,
}

#[async_trait]
impl Hook for CaptureHook {
    fn name(&self) -> &str {
        self.name
    }

    fn phase(&self) -> HookPhase {
        self.phase
    }

    async fn execute(&self, event: &HookEvent) -> HookResult {
        match event {
            HookEvent::BeforeCompaction(e) => {
                self.plugin.on_before_compaction(&e.messages).await;
            }
            HookEvent::BeforeReset(e) => {
                self.plugin.on_before_reset(&e.messages).await;
            }
            HookEvent::AgentEnd(e) => {
                self.plugin.on_agent_end(e.success, &e.messages).await;
            }
            HookEvent::BeforeAgentStart(_) => {}
        }
        HookResult::Continue
    }
}
