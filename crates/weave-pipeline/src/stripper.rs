//! Background post-turn stripper: a worker independent of the per-turn
//! critical path that compresses accepted turns into a
//! `strippedTurn` form a later [`weave_promptbuilder`] pass can use in place
//! of raw input/response.

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use weave_core::Turn;
use weave_llm::ModelClient;
use weave_store::ConversationStore;

const TECHNICAL_CALL_PROMPT_PREFIX: &str = "Condense this exchange to its essential content, \
preserving names, facts, and decisions, in no more than two sentences.\n\n";

/// One strip-down pass: finds turns still missing `strippedTurn`, compresses
/// each with a technical LLM call, and writes the result back. Failures on
/// individual turns are logged and skipped; the turn is retried on the next
/// pass since `stripped_turn` was never set.
pub struct PostTurnStripper {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ModelClient>,
    concurrency: usize,
}

impl PostTurnStripper {
    pub fn new(store: Arc<dyn ConversationStore>, model: Arc<dyn ModelClient>, concurrency: usize) -> Self {
        Self {
            store,
            model,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs continuous passes on `interval`, each scanning up to `batch_size`
    /// pending turns, until `cancel` fires.
    pub async fn run(&self, batch_size: u32, interval: std::time::Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("post-turn stripper stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {
                    if let Err(error) = self.run_once(batch_size, &cancel).await {
                        warn!(%error, "post-turn stripper pass failed");
                    }
                }
            }
        }
    }

    /// One pass, exposed separately so tests and the CLI demo can drive it
    /// without waiting on a timer.
    #[instrument(skip(self, cancel))]
    pub async fn run_once(&self, batch_size: u32, cancel: &CancellationToken) -> Result<usize> {
        let pending = self.store.get_turns_missing_stripped(batch_size).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let concurrency = self.concurrency;
        let processed = stream::iter(pending)
            .map(|turn| self.strip_one(turn, cancel.clone()))
            .buffer_unordered(concurrency)
            .filter(|result| futures::future::ready(result.is_ok()))
            .count()
            .await;

        info!(processed, "post-turn stripper pass complete");
        Ok(processed)
    }

    async fn strip_one(&self, turn: Turn, cancel: CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(anyhow::anyhow!("stripper cancelled"));
        }

        let exchange = format!(
            "{}User: {}\nAssistant: {}",
            TECHNICAL_CALL_PROMPT_PREFIX,
            turn.input,
            turn.response.as_deref().unwrap_or(""),
        );
        let request = serde_json::json!({ "prompt": exchange });

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(anyhow::anyhow!("stripper cancelled")),
            outcome = self.model.generate_content(request, true, Some(turn.id.get())) => outcome,
        };

        match outcome {
            Ok(outcome) if outcome.success && !outcome.text.trim().is_empty() => {
                self.store.update_stripped_turn(turn.id, outcome.text).await?;
                Ok(())
            }
            Ok(_) => {
                warn!(turn_id = turn.id.get(), "stripper call returned no usable text, will retry");
                Err(anyhow::anyhow!("empty stripper response"))
            }
            Err(error) => {
                warn!(%error, turn_id = turn.id.get(), "stripper LLM call failed, will retry");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use weave_core::{ProfileId, Session, SessionId};
    use weave_llm::MockModelClient;
    use weave_store::InMemoryStore;

    #[tokio::test]
    async fn strips_pending_turns_and_writes_back() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_session(Session {
                id: SessionId::new(1),
                profile_id: ProfileId::new(1),
                active_persona_id: None,
                created_at: Utc::now(),
            })
            .await;
        let mut turn = store.create_turn(SessionId::new(1), "Hello".into()).await.unwrap();
        turn.response = Some("Hi there".into());
        turn.accepted = true;
        store.commit_turn(turn.clone()).await.unwrap();

        let model: Arc<dyn ModelClient> = Arc::new(MockModelClient::always_replying("Greeting exchanged."));
        let stripper = PostTurnStripper::new(store.clone(), model, 4);

        let processed = stripper.run_once(10, &CancellationToken::new()).await.unwrap();
        assert_eq!(processed, 1);

        let remaining = store.get_turns_missing_stripped(10).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn idle_when_nothing_is_pending() {
        let store = Arc::new(InMemoryStore::new());
        let model: Arc<dyn ModelClient> = Arc::new(MockModelClient::always_replying("unused"));
        let stripper = PostTurnStripper::new(store, model, 4);

        let processed = stripper.run_once(10, &CancellationToken::new()).await.unwrap();
        assert_eq!(processed, 0);
    }

    #[tokio::test]
    async fn failed_strip_leaves_turn_pending_for_retry() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_session(Session {
                id: SessionId::new(1),
                profile_id: ProfileId::new(1),
                active_persona_id: None,
                created_at: Utc::now(),
            })
            .await;
        let mut turn = store.create_turn(SessionId::new(1), "Hello".into()).await.unwrap();
        turn.response = Some("Hi there".into());
        turn.accepted = true;
        store.commit_turn(turn).await.unwrap();

        let model: Arc<dyn ModelClient> = Arc::new(MockModelClient::new(Arc::new(
            |_req, _technical, _turn| weave_llm::GenerateOutcome {
                success: false,
                text: String::new(),
            },
        )));
        let stripper = PostTurnStripper::new(store.clone(), model, 4);

        let processed = stripper.run_once(10, &CancellationToken::new()).await.unwrap();
        assert_eq!(processed, 0);

        let remaining = store.get_turns_missing_stripped(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
