//! Thin composition layer over [`ConversationStore`] implementing the
//! context-item service operations: the always-on/manual/trigger-candidate/
//! user-profile lookups are direct delegations, while `evaluate_triggers`
//! adds the scan-corpus construction and keyword-matching logic that the
//! store itself has no business knowing about.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use weave_core::{ContextData, ContextType, ProfileId, SessionId, TurnId};
use weave_store::ConversationStore;

use crate::trigger::{matched_keywords, tokenize_words};

pub struct ContextItemService {
    store: Arc<dyn ConversationStore>,
}

impl ContextItemService {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn get_always_on(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>> {
        self.store.get_always_on(profile_id, ty).await
    }

    pub async fn get_active_manual(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>> {
        self.store.get_active_manual(profile_id, ty).await
    }

    pub async fn get_trigger_candidates(&self, profile_id: ProfileId) -> Result<Vec<ContextData>> {
        self.store.get_trigger_candidates(profile_id).await
    }

    pub async fn get_user_profile(&self, profile_id: ProfileId) -> Result<Option<ContextData>> {
        self.store.get_user_profile(profile_id).await
    }

    pub async fn process_post_turn(&self, turn_id: TurnId) -> Result<usize> {
        self.store.process_post_turn(turn_id).await
    }

    /// Evaluates every candidate's trigger keywords against its own
    /// scan corpus: the current input plus the text (input and response) of
    /// the last `triggerLookbackTurns` accepted turns for that candidate —
    /// each candidate's lookback window is independent, since
    /// `triggerLookbackTurns` is a per-item field. An item activates when the
    /// number of *distinct* matched keywords is at least its
    /// `triggerMinMatchCount`.
    pub async fn evaluate_triggers(
        &self,
        session_id: SessionId,
        current_input: &str,
        candidates: Vec<ContextData>,
    ) -> Result<Vec<ContextData>> {
        let mut activated = Vec::new();
        for item in candidates {
            let keywords = item.trigger_keyword_list();
            if keywords.is_empty() {
                continue;
            }

            let lookback = item.trigger_lookback_turns.max(0) as u32;
            let mut corpus_parts = vec![current_input.to_string()];
            if lookback > 0 {
                let turns = self.store.get_recent_accepted_turns(session_id, lookback).await?;
                for turn in &turns {
                    corpus_parts.push(turn.display_input().to_string());
                    if let Some(response) = &turn.response {
                        corpus_parts.push(response.clone());
                    }
                }
            }
            let corpus_text = corpus_parts.join(" \n ");
            let corpus_text_lower = corpus_text.to_lowercase();
            let corpus_tokens = tokenize_words(&corpus_text);

            let matched: HashSet<String> = matched_keywords(&keywords, &corpus_tokens, &corpus_text_lower)
                .into_iter()
                .collect();

            let threshold = item.trigger_min_match_count.max(1) as usize;
            if matched.len() >= threshold {
                activated.push(item);
            }
        }
        Ok(activated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::{Availability, ContextId, SessionId as WSessionId};
    use weave_store::InMemoryStore;

    fn item(id: i64, keywords: &str, min_match: i64, lookback: i64) -> ContextData {
        ContextData {
            id: ContextId::new(id),
            profile_id: ProfileId::new(1),
            ty: ContextType::Memory,
            availability: Availability::Trigger,
            name: Some(format!("item-{id}")),
            content: "content".into(),
            speaker: None,
            source_session_id: None,
            tags: vec![],
            sort_order: 0,
            token_count: 0,
            vector_id: None,
            in_vector_db: false,
            embedding_updated_at: None,
            use_every_turn: false,
            use_next_turn_only: false,
            previous_availability: None,
            trigger_keywords: Some(keywords.to_string()),
            trigger_min_match_count: min_match,
            trigger_lookback_turns: lookback,
            is_enabled: true,
            is_archived: false,
            is_user: false,
            used_last_on_turn_id: None,
            relevance_score: None,
            process_weight: None,
        }
    }

    #[tokio::test]
    async fn activates_item_when_match_count_reaches_threshold() {
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
        let service = ContextItemService::new(store);
        let session_id = WSessionId::new(1);

        let candidates = vec![item(1, "weather, rain", 2, 0)];
        let activated = service
            .evaluate_triggers(session_id, "I love the rain and the weather here", candidates)
            .await
            .unwrap();
        assert_eq!(activated.len(), 1);
    }

    #[tokio::test]
    async fn does_not_activate_below_threshold() {
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
        let service = ContextItemService::new(store);
        let session_id = WSessionId::new(1);

        let candidates = vec![item(1, "weather, rain", 2, 0)];
        let activated = service
            .evaluate_triggers(session_id, "I love the rain today", candidates)
            .await
            .unwrap();
        assert!(activated.is_empty());
    }

    #[tokio::test]
    async fn items_without_keywords_never_activate() {
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
        let service = ContextItemService::new(store);
        let session_id = WSessionId::new(1);

        let mut no_keywords = item(1, "", 1, 0);
        no_keywords.trigger_keywords = None;
        let activated = service
            .evaluate_triggers(session_id, "anything at all", vec![no_keywords])
            .await
            .unwrap();
        assert!(activated.is_empty());
    }
}
