//! Liveness gate consulted before any pipeline does remote work.
//!
//! The check is never cached: every pipeline invocation asks the service
//! again, so a restarted service is picked up on the next lifecycle event.

use tracing::warn;

use crate::client::GraphApi;

/// Uncached health guard over a [`GraphApi`].
pub struct HealthGate<'a> {
    graph: &'a dyn GraphApi,
}

impl<'a> HealthGate<'a> {
    pub fn new(graph: &'a dyn GraphApi) -> Self {
        Self { graph }
    }

    /// Returns `true` when `pipeline` may proceed. Logs a warning otherwise.
    pub async fn check(&self, pipeline: &str) -> bool {
        let healthy = self.graph.healthy().await;
        if !healthy {
            warn!(
                pipeline,
                group_id = self.graph.group_id(),
                "Knowledge graph unavailable, skipping"
            );
        }
        healthy
    }
}
