//! Containment boundary for best-effort pipelines.
//!
//! Recall and capture enrich the conversation but are never required for it.
//! Each pipeline runs its body through [`contain`], which turns any failure
//! into a logged no-op so nothing propagates to the host's lifecycle event.

use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Run `work`, returning its value or `None` after logging the failure.
pub async fn contain<T, E, F>(pipeline: &str, work: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match work.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(pipeline, error = %e, "Pipeline failed, continuing without it");
            None
        }
    }
}
