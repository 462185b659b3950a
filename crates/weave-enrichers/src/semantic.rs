//! SemanticDataEnricher: nearest-neighbor retrieval over Quote, Memory,
//! Insight, PersonaVoiceSample, with an optional LLM-driven multi-query
//! reformulation path.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weave_config::AppConfig;
use weave_core::{ContextData, ContextId, ContextType, ConversationState, TypedCollection};
use weave_llm::{extract_json_array, ModelClient};
use weave_store::ConversationStore;
use weave_vector::{collection_name, VectorStore};

use crate::traits::Enricher;

const SEMANTIC_TYPES: [ContextType; 4] = [
    ContextType::Quote,
    ContextType::Memory,
    ContextType::Insight,
    ContextType::PersonaVoiceSample,
];

/// Fixed system prompt for the multi-query reformulation call: a fixed
/// instruction enumerating the reformulation axes.
const REFORMULATION_SYSTEM_PROMPT: &str = "\
Given the user's latest message, produce exactly six reformulated search \
queries capturing it from these distinct angles, in this order: \
self-reflection A, self-reflection B, observation, narrative, dialogue, metaphor. \
Respond with a JSON array of exactly six strings and nothing else.";

fn collection_for<'a>(state: &'a ConversationState, ty: ContextType) -> &'a TypedCollection {
    match ty {
        ContextType::Quote => &state.quotes,
        ContextType::Memory => &state.memories,
        ContextType::Insight => &state.insights,
        ContextType::PersonaVoiceSample => &state.persona_voice_samples,
        ContextType::CharacterProfile | ContextType::Generic => unreachable!("not semantic-eligible"),
    }
}

pub struct SemanticDataEnricher {
    store: Arc<dyn ConversationStore>,
    vector_store: Arc<dyn VectorStore>,
    model: Arc<dyn ModelClient>,
    config: AppConfig,
}

impl SemanticDataEnricher {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        vector_store: Arc<dyn VectorStore>,
        model: Arc<dyn ModelClient>,
        config: AppConfig,
    ) -> Self {
        Self { store, vector_store, model, config }
    }

    async fn reformulated_queries(&self, input: &str) -> Option<Vec<String>> {
        let request = serde_json::json!({
            "system": REFORMULATION_SYSTEM_PROMPT,
            "messages": [{ "role": "user", "content": input }],
        });
        let outcome = self.model.generate_content(request, true, None).await.ok()?;
        if !outcome.success {
            return None;
        }
        let queries: Vec<String> = extract_json_array(&outcome.text)?;
        if queries.is_empty() {
            None
        } else {
            Some(queries)
        }
    }

    /// `(type, query_embedding)` pairs search their own limited collection;
    /// results aggregate across the whole batch by `dbPK`, keeping the max
    /// score per id, then the per-type limit is re-applied.
    async fn search_and_aggregate(
        &self,
        profile_id: weave_core::ProfileId,
        queries_by_type: &[(ContextType, Vec<f32>)],
    ) -> anyhow::Result<HashMap<ContextType, Vec<(ContextId, f32)>>> {
        let mut per_type: HashMap<ContextType, HashMap<ContextId, f32>> = HashMap::new();

        for (ty, embedding) in queries_by_type {
            let limit = self.config.semantic_quota_for(*ty).max(0) as usize;
            if limit == 0 {
                continue;
            }
            let hits = self
                .vector_store
                .search(collection_name(*ty), embedding, limit, profile_id)
                .await?;
            let bucket = per_type.entry(*ty).or_default();
            for hit in hits {
                let entry = bucket.entry(hit.payload.db_pk).or_insert(hit.score);
                if hit.score > *entry {
                    *entry = hit.score;
                }
            }
        }

        let mut ranked = HashMap::new();
        for (ty, scores) in per_type {
            let limit = self.config.semantic_quota_for(ty).max(0) as usize;
            let mut ordered: Vec<(ContextId, f32)> = scores.into_iter().collect();
            ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.get().cmp(&b.0.get())));
            ordered.truncate(limit);
            ranked.insert(ty, ordered);
        }
        Ok(ranked)
    }

    async fn insert_ranked(&self, state: &ConversationState, ranked: HashMap<ContextType, Vec<(ContextId, f32)>>) -> anyhow::Result<()> {
        for (ty, scored_ids) in ranked {
            if scored_ids.is_empty() {
                continue;
            }
            let ids: Vec<ContextId> = scored_ids.iter().map(|(id, _)| *id).collect();
            let items = self.store.get_by_ids(&ids).await?;
            let by_id: HashMap<ContextId, ContextData> = items.into_iter().map(|item| (item.id, item)).collect();

            let collection = collection_for(state, ty);
            for (id, score) in scored_ids {
                if let Some(mut item) = by_id.get(&id).cloned() {
                    item.process_weight = Some(score);
                    collection.insert(item);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Enricher for SemanticDataEnricher {
    fn name(&self) -> &'static str {
        "semantic_data"
    }

    async fn enrich(&self, state: &ConversationState, cancel: &CancellationToken) -> anyhow::Result<()> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let profile_id = state.session.profile_id;
        let input = &state.current_turn.input;

        if self.config.semantic_use_llm_query_transformation {
            if let Some(queries) = self.reformulated_queries(input).await {
                let embeddings = self.model.batch_embed(&queries).await?;
                let mut pairs = Vec::with_capacity(SEMANTIC_TYPES.len() * embeddings.len());
                for ty in SEMANTIC_TYPES {
                    for embedding in &embeddings {
                        pairs.push((ty, embedding.clone()));
                    }
                }
                let ranked = self.search_and_aggregate(profile_id, &pairs).await?;
                return self.insert_ranked(state, ranked).await;
            }
            tracing::debug!("multi-query reformulation unavailable, falling back to single-query path");
        }

        let embeddings = self.model.batch_embed(std::slice::from_ref(input)).await?;
        let Some(embedding) = embeddings.into_iter().next() else {
            return Ok(());
        };
        let pairs: Vec<_> = SEMANTIC_TYPES.iter().map(|ty| (*ty, embedding.clone())).collect();
        let ranked = self.search_and_aggregate(profile_id, &pairs).await?;
        self.insert_ranked(state, ranked).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use weave_core::{Availability, ProfileId, Session, SessionId, Turn, TurnId};
    use weave_llm::MockModelClient;
    use weave_store::InMemoryStore;
    use weave_vector::{build_chunks, ChunkPayload, InMemoryVectorStore};

    fn item(id: i64, ty: ContextType) -> ContextData {
        ContextData {
            id: ContextId::new(id),
            profile_id: ProfileId::new(1),
            ty,
            availability: Availability::Semantic,
            name: Some(format!("item-{id}")),
            content: "the user enjoys long walks in the rain".into(),
            speaker: None,
            source_session_id: None,
            tags: vec![],
            sort_order: 0,
            token_count: 0,
            vector_id: None,
            in_vector_db: true,
            embedding_updated_at: None,
            use_every_turn: false,
            use_next_turn_only: false,
            previous_availability: None,
            trigger_keywords: None,
            trigger_min_match_count: 1,
            trigger_lookback_turns: 0,
            is_enabled: true,
            is_archived: false,
            is_user: false,
            used_last_on_turn_id: None,
            relevance_score: None,
            process_weight: None,
        }
    }

    fn state() -> ConversationState {
        let session = Session {
            id: SessionId::new(1),
            profile_id: ProfileId::new(1),
            active_persona_id: None,
            created_at: Utc::now(),
        };
        let turn = Turn::new_pending(TurnId::new(1), session.id, "tell me about the rain".into(), Utc::now());
        ConversationState::new(session, turn, None)
    }

    #[tokio::test]
    async fn single_query_path_inserts_matching_item_and_stamps_process_weight() {
        let store = Arc::new(InMemoryStore::new());
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let model = Arc::new(MockModelClient::always_replying("unused"));

        let memory_item = item(1, ContextType::Memory);
        store.upsert_context_item(memory_item.clone()).await.unwrap();

        vector_store.ensure_collection(collection_name(ContextType::Memory)).await.unwrap();
        let chunks = build_chunks(&memory_item, None);
        let embedding = model.batch_embed(&[memory_item.content.clone()]).await.unwrap().remove(0);
        vector_store
            .upsert(
                collection_name(ContextType::Memory),
                chunks[0].chunk_id,
                embedding,
                ChunkPayload {
                    payload_id: chunks[0].payload_id.clone(),
                    source_session_id: None,
                    speaker: None,
                    truth_type: ContextType::Memory,
                    db_pk: memory_item.id,
                    profile_id: ProfileId::new(1),
                },
            )
            .await
            .unwrap();

        let mut config = AppConfig::default();
        config.semantic_use_llm_query_transformation = false;

        let enricher = SemanticDataEnricher::new(store, vector_store, model, config);
        let state = state();
        enricher.enrich(&state, &CancellationToken::new()).await.unwrap();

        assert_eq!(state.memories.len(), 1);
        let snapshot = state.memories.snapshot();
        assert!(snapshot[0].process_weight.is_some());
    }
}
