//! graphmem-core - Core library for graphmem
//!
//! This crate provides the pieces shared by the hook pipelines and the CLI:
//!
//! - **client**: HTTP client for the temporal knowledge-graph service
//! - **health**: Uncached liveness gate consulted before remote work
//! - **types**: Facts, episodes and outbound messages
//! - **config**: TOML + environment configuration
//! - **time**: Timestamp helpers

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod time;
pub mod types;

// Re-export commonly used types
pub use client::{GraphApi, GraphClient, Timeouts};
pub use config::Config;
pub use error::{Error, Result};
pub use health::HealthGate;
pub use types::{Episode, Fact, IngestResult, Message, RoleType};
