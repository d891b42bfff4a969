//! Agent Lifecycle Hooks
//!
//! Typed handlers for the host's lifecycle events. The memory plugin
//! registers one recall hook and three capture hooks; hosts may add their
//! own.
//!
//! # Phases
//!
//! - `before_agent_start`: before a turn runs, may return context to prepend
//! - `before_compaction`: before conversation content is summarized away
//! - `before_reset`: before the session is cleared
//! - `agent_end`: after a turn completes
//!
//! # Example
//!
//! ```rust
//! use graphmem_sdk::hooks::{Hook, HookEvent, HookPhase, HookResult};
//! use async_trait::async_trait;
//!
//! struct Banner;
//!
//! #[async_trait]
//! impl Hook for Banner {
//!     fn name(&self) -> &str {
//!         "banner"
//!     }
//!
//!     fn phase(&self) -> HookPhase {
//!         HookPhase::BeforeAgentStart
//!     }
//!
//!     async fn execute(&self, _event: &HookEvent) -> HookResult {
//!         HookResult::PrependContext("Remember to be concise.".into())
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::content::Turn;
use crate::error::{SdkError, SdkResult};

// ─────────────────────────────────────────────────────────────────────────────
// Hook Phase Enum
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle event at which a hook executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    /// Before the agent processes a prompt.
    /// Hooks at this phase may prepend context.
    BeforeAgentStart,

    /// Before conversation content is compacted.
    BeforeCompaction,

    /// Before the session is reset.
    BeforeReset,

    /// After the agent finishes a turn.
    AgentEnd,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::BeforeAgentStart => write!(f, "before_agent_start"),
            HookPhase::BeforeCompaction => write!(f, "before_compaction"),
            HookPhase::BeforeReset => write!(f, "before_reset"),
            HookPhase::AgentEnd => write!(f, "agent_end"),
        }
    }
}

impl FromStr for HookPhase {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before_agent_start" => Ok(HookPhase::BeforeAgentStart),
            "before_compaction" => Ok(HookPhase::BeforeCompaction),
            "before_reset" => Ok(HookPhase::BeforeReset),
            "agent_end" => Ok(HookPhase::AgentEnd),
            other => Err(SdkError::invalid_input(format!("unknown hook phase '{other}'"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of `before_agent_start`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeforeAgentStartEvent {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Payload of `before_compaction` and `before_reset`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesEvent {
    #[serde(default)]
    pub messages: Vec<Turn>,
}

/// Payload of `agent_end`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentEndEvent {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<Turn>,
}

/// A lifecycle event with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    BeforeAgentStart(BeforeAgentStartEvent),
    BeforeCompaction(MessagesEvent),
    BeforeReset(MessagesEvent),
    AgentEnd(AgentEndEvent),
}

impl HookEvent {
    pub fn phase(&self) -> HookPhase {
        match self {
            HookEvent::BeforeAgentStart(_) => HookPhase::BeforeAgentStart,
            HookEvent::BeforeCompaction(_) => HookPhase::BeforeCompaction,
            HookEvent::BeforeReset(_) => HookPhase::BeforeReset,
            HookEvent::AgentEnd(_) => HookPhase::AgentEnd,
        }
    }

    /// Decode the host's JSON payload for `phase`.
    pub fn from_json(phase: HookPhase, payload: Value) -> SdkResult<Self> {
        Ok(match phase {
            HookPhase::BeforeAgentStart => {
                HookEvent::BeforeAgentStart(serde_json::from_value(payload)?)
            }
            HookPhase::BeforeCompaction => {
                HookEvent::BeforeCompaction(serde_json::from_value(payload)?)
            }
            HookPhase::BeforeReset => HookEvent::BeforeReset(serde_json::from_value(payload)?),
            HookPhase::AgentEnd => HookEvent::AgentEnd(serde_json::from_value(payload)?),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook Result
// ─────────────────────────────────────────────────────────────────────────────

/// Result of hook execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookResult {
    /// Nothing to contribute.
    Continue,
    /// Context to prepend to the upcoming prompt.
    PrependContext(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for implementing lifecycle hooks.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Name of the hook (for logging/unregistering).
    fn name(&self) -> &str;

    /// Phase at which this hook executes.
    fn phase(&self) -> HookPhase;

    /// Priority (lower runs first, default 100).
    fn priority(&self) -> i32 {
        100
    }

    /// Execute the hook.
    async fn execute(&self, event: &HookEvent) -> HookResult;
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry for managing hooks.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<HookPhase, Vec<Arc<dyn Hook>>>>,
}

impl HookRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook.
    pub async fn register(&self, hook: Arc<dyn Hook>) {
        let mut hooks = self.hooks.write().await;
        let phase = hook.phase();
        let phase_hooks = hooks.entry(phase).or_default();
        phase_hooks.push(hook);
        phase_hooks.sort_by_key(|h| h.priority());
    }

    /// Unregister a hook by name.
    pub async fn unregister(&self, name: &str) {
        let mut hooks = self.hooks.write().await;
        for phase_hooks in hooks.values_mut() {
            phase_hooks.retain(|h| h.name() != name);
        }
    }

    /// Get all hooks for a phase.
    pub async fn get_hooks(&self, phase: HookPhase) -> Vec<Arc<dyn Hook>> {
        let hooks = self.hooks.read().await;
        hooks.get(&phase).cloned().unwrap_or_default()
    }

    /// Run every hook for the event's phase.
    ///
    /// Returns the contributed contexts joined by a blank line, or `None`
    /// when no hook contributed.
    pub async fn dispatch(&self, event: &HookEvent) -> Option<String> {
        let hooks = self.get_hooks(event.phase()).await;

        let mut contexts = Vec::new();
        for hook in hooks {
            match hook.execute(event).await {
                HookResult::Continue => {}
                HookResult::PrependContext(context) => {
                    debug!(hook = hook.name(), phase = %event.phase(), "Hook contributed context");
                    contexts.push(context);
                }
            }
        }

        if contexts.is_empty() {
            None
        } else {
            Some(contexts.join("\n\n"))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating hooks from closures.
pub struct HookBuilder {
    name: String,
    phase: HookPhase,
    priority: i32,
}

impl HookBuilder {
    /// Create a new hook builder.
    pub fn new(name: impl Into<String>, phase: HookPhase) -> Self {
        Self {
            name: name.into(),
            phase,
            priority: 100,
        }
    }

    /// Set priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Build with an async closure receiving a copy of the event.
    pub fn build<F, Fut>(self, handler: F) -> ClosureHook<F>
    where
        F: Fn(HookEvent) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HookResult> + Send + 'static,
    {
        ClosureHook {
            name: self.name,
            phase: self.phase,
            priority: self.priority,
            handler,
        }
    }
}

/// Hook implementation using a closure.
pub struct ClosureHook<F> {
    name: String,
    phase: HookPhase,
    priority: i32,
    handler: F,
}

#[async_trait]
impl<F, Fut> Hook for ClosureHook<F>
where
    F: Fn(HookEvent) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = HookResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> HookPhase {
        self.phase
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn execute(&self, event: &HookEvent) -> HookResult {
        (self.handler)(event.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn start(prompt: &str) -> HookEvent {
        HookEvent::BeforeAgentStart(BeforeAgentStartEvent {
            prompt: Some(prompt.into()),
        })
    }

    #[test]
    fn test_hook_phase_display_and_parse() {
        assert_eq!(HookPhase::BeforeAgentStart.to_string(), "before_agent_start");
        assert_eq!(HookPhase::AgentEnd.to_string(), "agent_end");
        assert_eq!(
            "before_reset".parse::<HookPhase>().unwrap(),
            HookPhase::BeforeReset
        );
        assert!("on_tag".parse::<HookPhase>().is_err());
    }

    #[test]
    fn test_event_from_json() {
        let event = HookEvent::from_json(
            HookPhase::AgentEnd,
            json!({
                "success": true,
                "messages": [{"role": "user", "content": [{"type": "text", "text": "hi"}]}]
            }),
        )
        .unwrap();
        match event {
            HookEvent::AgentEnd(end) => {
                assert!(end.success);
                assert_eq!(end.messages[0].content.text(), "hi");
            }
            other => panic!("unexpected event {other:?}"),
        }

        let event = HookEvent::from_json(HookPhase::BeforeAgentStart, json!({})).unwrap();
        assert_eq!(
            event,
            HookEvent::BeforeAgentStart(BeforeAgentStartEvent { prompt: None })
        );

        assert!(HookEvent::from_json(HookPhase::BeforeCompaction, json!({"messages": 3})).is_err());
    }

    #[tokio::test]
    async fn test_dispatch_joins_contexts_in_priority_order() {
        let registry = HookRegistry::new();
        registry
            .register(Arc::new(
                HookBuilder::new("second", HookPhase::BeforeAgentStart)
                    .priority(200)
                    .build(|_| async { HookResult::PrependContext("B".into()) }),
            ))
            .await;
        registry
            .register(Arc::new(
                HookBuilder::new("first", HookPhase::BeforeAgentStart)
                    .priority(10)
                    .build(|_| async { HookResult::PrependContext("A".into()) }),
            ))
            .await;
        registry
            .register(Arc::new(
                HookBuilder::new("quiet", HookPhase::BeforeAgentStart)
                    .build(|_| async { HookResult::Continue }),
            ))
            .await;

        let hooks = registry.get_hooks(HookPhase::BeforeAgentStart).await;
        let names: Vec<&str> = hooks.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["first", "quiet", "second"]);

        assert_eq!(
            registry.dispatch(&start("hello world")).await.as_deref(),
            Some("A\n\nB")
        );
    }

    #[tokio::test]
    async fn test_dispatch_without_context_is_none() {
        let registry = HookRegistry::new();
        assert_eq!(registry.dispatch(&start("hello world")).await, None);

        registry
            .register(Arc::new(
                HookBuilder::new("end", HookPhase::AgentEnd)
                    .build(|_| async { HookResult::PrependContext("ignored".into()) }),
            ))
            .await;
        assert_eq!(registry.dispatch(&start("hello world")).await, None);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = HookRegistry::new();
        registry
            .register(Arc::new(
                HookBuilder::new("temp", HookPhase::BeforeReset)
                    .build(|_| async { HookResult::Continue }),
            ))
            .await;
        assert_eq!(registry.get_hooks(HookPhase::BeforeReset).await.len(), 1);

        registry.unregister("temp").await;
        assert!(registry.get_hooks(HookPhase::BeforeReset).await.is_empty());
    }
}
