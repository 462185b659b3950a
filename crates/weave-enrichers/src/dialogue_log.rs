//! DialogueLogEnricher: the next-older slice of accepted turns, beyond the
//! `recentTurnsCount` window already owned by
//! [`crate::turn_history::TurnHistoryEnricher`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weave_core::{ConversationState, Turn};
use weave_store::ConversationStore;

use crate::traits::Enricher;

/// Literal header required verbatim.
const HEADER: &str =
    "[meta] Log: Older events this session - For Information Only, DO NOT USE THIS FORMAT";

/// Wording is this implementation's own choice; only a truncation notice of
/// some form is required.
const TRUNCATION_NOTICE: &str = "(earlier history in this session has been omitted)";

pub struct DialogueLogEnricher {
    store: Arc<dyn ConversationStore>,
    recent_turns_count: u32,
    max_dialogue_log_turns: u32,
}

impl DialogueLogEnricher {
    pub fn new(store: Arc<dyn ConversationStore>, recent_turns_count: u32, max_dialogue_log_turns: u32) -> Self {
        Self {
            store,
            recent_turns_count,
            max_dialogue_log_turns,
        }
    }
}

fn format_turn(turn: &Turn) -> String {
    if turn.stripped_turn.is_some() {
        turn.display_input().to_string()
    } else {
        match &turn.response {
            Some(response) if !response.trim().is_empty() => format!("{}\n{}", turn.input, response),
            _ => turn.input.clone(),
        }
    }
}

#[async_trait]
impl Enricher for DialogueLogEnricher {
    fn name(&self) -> &'static str {
        "dialogue_log"
    }

    async fn enrich(&self, state: &ConversationState, _cancel: &CancellationToken) -> anyhow::Result<()> {
        let (older, truncated) = self
            .store
            .get_dialogue_log_turns(state.session.id, self.recent_turns_count, self.max_dialogue_log_turns)
            .await?;

        if older.is_empty() {
            return Ok(());
        }

        let mut parts = Vec::with_capacity(older.len() + 2);
        if truncated {
            parts.push(TRUNCATION_NOTICE.to_string());
        }
        parts.push(HEADER.to_string());
        parts.extend(older.iter().map(format_turn));

        *state.dialogue_log.lock().expect("dialogue_log mutex poisoned") = parts.join("\n\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use weave_core::{ProfileId, Session, SessionId, TurnId};
    use weave_store::InMemoryStore;

    fn state() -> ConversationState {
        let session = Session {
            id: SessionId::new(1),
            profile_id: ProfileId::new(1),
            active_persona_id: None,
            created_at: Utc::now(),
        };
        let turn = Turn::new_pending(TurnId::new(99), session.id, "Hello".into(), Utc::now());
        ConversationState::new(session, turn, None)
    }

    #[tokio::test]
    async fn empty_history_yields_empty_dialogue_log() {
        let store = Arc::new(InMemoryStore::new());
        let enricher = DialogueLogEnricher::new(store, 6, 50);
        let state = state();
        enricher.enrich(&state, &CancellationToken::new()).await.unwrap();
        assert_eq!(*state.dialogue_log.lock().unwrap(), "");
    }

    #[tokio::test]
    async fn older_turns_are_wrapped_under_the_literal_header() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..3 {
            let mut turn = Turn::new_pending(TurnId::new(i + 1), SessionId::new(1), format!("input {i}"), Utc::now());
            turn.response = Some(format!("response {i}"));
            turn.accepted = true;
            store.commit_turn(turn).await.unwrap();
        }

        // recent_turns_count=1 excludes only the newest turn, leaving two older ones.
        let enricher = DialogueLogEnricher::new(store, 1, 50);
        let state = state();
        enricher.enrich(&state, &CancellationToken::new()).await.unwrap();

        let log = state.dialogue_log.lock().unwrap().clone();
        assert!(log.contains(HEADER));
        assert!(log.contains("input 0"));
        assert!(!log.contains(TRUNCATION_NOTICE));
    }

    #[tokio::test]
    async fn beyond_cap_turns_trigger_truncation_notice() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..5 {
            let mut turn = Turn::new_pending(TurnId::new(i + 1), SessionId::new(1), format!("input {i}"), Utc::now());
            turn.response = Some(format!("response {i}"));
            turn.accepted = true;
            store.commit_turn(turn).await.unwrap();
        }

        let enricher = DialogueLogEnricher::new(store, 1, 2);
        let state = state();
        enricher.enrich(&state, &CancellationToken::new()).await.unwrap();

        let log = state.dialogue_log.lock().unwrap().clone();
        assert!(log.contains(TRUNCATION_NOTICE));
    }
}
