//! Per-turn orchestration: resolve the session, enrich a fresh
//! [`ConversationState`], build a provider-shaped request, dispatch it, and
//! commit the outcome.

use std::sync::Arc;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use weave_config::{AppConfig, LlmProvider};
use weave_core::{ConversationState, SessionId, Turn};
use weave_enrichers::Orchestrator;
use weave_llm::ModelClient;
use weave_store::ConversationStore;
use weave_vector::VectorStore;

use crate::error::PipelineError;

/// One fully wired instance serves every turn for a process: the store,
/// vector index, and model client are the three external collaborators;
/// configuration is resolved once and shared.
pub struct ConversationPipeline {
    store: Arc<dyn ConversationStore>,
    vector_store: Arc<dyn VectorStore>,
    model: Arc<dyn ModelClient>,
    config: AppConfig,
}

impl ConversationPipeline {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        vector_store: Arc<dyn VectorStore>,
        model: Arc<dyn ModelClient>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            vector_store,
            model,
            config,
        }
    }

    /// Runs one turn end to end. Only configuration-missing and commit-write
    /// failures are surfaced to the caller; every other failure mode along
    /// the way (an enricher, the dispatcher, post-turn processing) is logged
    /// and absorbed so the turn still reaches a committed state.
    #[instrument(skip(self, input, cancel), fields(session = session_id.get()))]
    pub async fn run_turn(
        &self,
        session_id: SessionId,
        input: String,
        cancel: CancellationToken,
    ) -> Result<Turn, PipelineError> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| PipelineError::ConfigurationMissing(format!("no session {session_id}")))?;

        if self.config.active_model().trim().is_empty() {
            return Err(PipelineError::ConfigurationMissing(
                "no model configured for the active LLM provider".into(),
            ));
        }

        let mut turn = self.store.create_turn(session_id, input).await?;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let persona = self.store.get_active_persona(session.profile_id).await?;
        let state = Arc::new(ConversationState::new(session, turn.clone(), persona));

        let enrichers = weave_enrichers::build_enrichers(
            Arc::clone(&self.store),
            Arc::clone(&self.vector_store),
            Arc::clone(&self.model),
            &self.config,
        );
        Orchestrator::new(enrichers).run(Arc::clone(&state), cancel.clone()).await;

        let built = weave_promptbuilder::build(&state, self.store.as_ref())
            .await
            .map_err(PipelineError::Store)?;
        let request = match self.config.llm_provider {
            LlmProvider::Gemini => weave_promptbuilder::gemini::serialize(&built, &self.config),
            LlmProvider::Claude => weave_promptbuilder::claude::serialize(&built, &self.config),
        };
        let serialized_request = request.to_string();

        let strategy = weave_dispatch::select_strategy(&self.config, Arc::clone(&self.model));
        let dispatch_outcome = strategy.execute(request, turn.id.get(), &cancel).await;

        turn.serialized_request = Some(serialized_request);

        match dispatch_outcome {
            Ok((success, text)) => {
                turn.response = Some(text);
                turn.accepted = success;
                self.store.commit_turn(turn.clone()).await?;

                let item_ids = state.all_item_ids();
                if !item_ids.is_empty() {
                    if let Err(error) = self.store.mark_used_bulk(&item_ids, turn.id).await {
                        warn!(%error, turn_id = turn.id.get(), "failed to mark context items used");
                    }
                }

                if let Err(error) = self.store.process_post_turn(turn.id).await {
                    warn!(%error, turn_id = turn.id.get(), "post-turn processing failed, will retry next turn");
                } else {
                    info!(turn_id = turn.id.get(), "turn committed");
                }
            }
            Err(dispatch_error) => {
                turn.response = Some(format!("Error: {dispatch_error}"));
                turn.accepted = false;
                warn!(%dispatch_error, turn_id = turn.id.get(), "dispatch failed, committing turn as unaccepted");
                self.store.commit_turn(turn.clone()).await?;
            }
        }

        Ok(turn)
    }
}

/// Convenience for callers that only have a cancellation-free path (e.g. the
/// CLI demo front end).
pub async fn run_turn_uncancellable(
    pipeline: &ConversationPipeline,
    session_id: SessionId,
    input: String,
) -> Result<Turn, PipelineError> {
    pipeline.run_turn(session_id, input, CancellationToken::new()).await
}
