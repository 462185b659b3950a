//! TurnHistoryEnricher: loads the most recent accepted turns and derives
//! `previousTurn`/`previousResponse` from the newest of them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weave_core::ConversationState;
use weave_store::ConversationStore;

use crate::traits::Enricher;

pub struct TurnHistoryEnricher {
    store: Arc<dyn ConversationStore>,
    recent_turns_count: u32,
}

impl TurnHistoryEnricher {
    pub fn new(store: Arc<dyn ConversationStore>, recent_turns_count: u32) -> Self {
        Self { store, recent_turns_count }
    }
}

#[async_trait]
impl Enricher for TurnHistoryEnricher {
    fn name(&self) -> &'static str {
        "turn_history"
    }

    async fn enrich(&self, state: &ConversationState, _cancel: &CancellationToken) -> anyhow::Result<()> {
        let turns = self
            .store
            .get_recent_accepted_turns(state.session.id, self.recent_turns_count)
            .await?;

        if let Some(newest) = turns.last() {
            *state.previous_turn.lock().expect("previous_turn mutex poisoned") = Some(newest.clone());
            *state.previous_response.lock().expect("previous_response mutex poisoned") =
                newest.response.clone().unwrap_or_default();
        }
        *state.recent_turns.lock().expect("recent_turns mutex poisoned") = turns;
        Ok(())
    }
}
