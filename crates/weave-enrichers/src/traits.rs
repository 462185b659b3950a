//! The enricher capability and the fan-out coordinator that runs all of them
//! against one [`ConversationState`]. A single shared trait stands in for
//! what would otherwise be a class hierarchy of enricher kinds.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use weave_core::ConversationState;

/// A component that populates a specific slice of `ConversationState` from
/// external sources. `enrich` never propagates an error upward — an enricher
/// that raises is logged and skipped by the orchestrator, which isolates
/// failures per enricher.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Short name used in logs when this enricher fails or is cancelled.
    fn name(&self) -> &'static str;

    async fn enrich(&self, state: &ConversationState, cancel: &CancellationToken) -> anyhow::Result<()>;
}

/// Runs every registered enricher against one state concurrently, aggregates
/// failures without aborting, and returns once all have settled.
///
/// Grounded on the reference codebase's parallel tool-call fan-out
/// (`execute_tool_calls` in `crates/runtime/src/tool_loop.rs`): each unit of
/// work becomes its own task, failures are captured per-task rather than
/// short-circuiting the whole batch, and the caller awaits all of them
/// before proceeding.
pub struct Orchestrator {
    enrichers: Vec<Arc<dyn Enricher>>,
}

impl Orchestrator {
    pub fn new(enrichers: Vec<Arc<dyn Enricher>>) -> Self {
        Self { enrichers }
    }

    /// Fans out one task per enricher, awaits all, and returns once every
    /// enricher has settled. Cancellation of the whole turn is not treated
    /// as an enricher failure — individual enrichers observe `cancel` and
    /// return early, which is logged the same as any other skip.
    pub async fn run(&self, state: Arc<ConversationState>, cancel: CancellationToken) {
        let handles: Vec<_> = self
            .enrichers
            .iter()
            .map(|enricher| {
                let enricher = Arc::clone(enricher);
                let state = Arc::clone(&state);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let name = enricher.name();
                    if cancel.is_cancelled() {
                        tracing::debug!(enricher = name, "skipped, turn already cancelled");
                        return;
                    }
                    match enricher.enrich(&state, &cancel).await {
                        Ok(()) => {}
                        Err(error) => {
                            tracing::warn!(enricher = name, %error, "enricher failed, skipping");
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            if let Err(join_error) = handle.await {
                tracing::warn!(%join_error, "enricher task panicked, skipping");
            }
        }
    }
}
