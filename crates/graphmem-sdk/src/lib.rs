//! graphmem SDK - Long-term memory for conversational agents
//!
//! Connects an agent host to a temporal knowledge-graph service. Two
//! pipelines run off the host's lifecycle events:
//!
//! - **recall** - before a turn, search the graph with the prompt and inject
//!   matching facts as a context block
//! - **capture** - before conversation content is compacted or reset, submit
//!   the text as one episode for asynchronous extraction
//!
//! Both are best-effort: every failure is contained, logged, and invisible to
//! the conversation. On-demand [`tools`] are the exception and report
//! failures back to the user.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use graphmem_sdk::{HookEvent, HookRegistry, MemoryPlugin};
//! use graphmem_sdk::hooks::BeforeAgentStartEvent;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let plugin = Arc::new(MemoryPlugin::from_config(graphmem_core::Config::load()?)?);
//!     let registry = HookRegistry::new();
//!     plugin.register_hooks(&registry).await;
//!
//!     let event = HookEvent::BeforeAgentStart(BeforeAgentStartEvent {
//!         prompt: Some("What database did we pick for the billing service?".into()),
//!     });
//!     if let Some(context) = registry.dispatch(&event).await {
//!         println!("{context}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod containment;
pub mod content;
pub mod hooks;
pub mod recall;
pub mod tools;

mod error;
mod plugin;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main SDK types
pub use capture::{CaptureOutcome, CaptureTrigger};
pub use content::{Turn, TurnContent};
pub use error::{SdkError, SdkResult};
pub use hooks::{Hook, HookEvent, HookPhase, HookRegistry, HookResult};
pub use plugin::MemoryPlugin;
pub use recall::RecallOutcome;
pub use tools::ToolOutput;

// Re-export core so hosts need a single dependency
pub use graphmem_core as core;
