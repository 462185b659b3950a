use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use weave_core::ProfileId;

use crate::traits::{ChunkPayload, SearchHit, VectorStore};

struct StoredVector {
    chunk_id: u32,
    vector: Vec<f32>,
    payload: ChunkPayload,
}

/// Brute-force cosine-similarity vector store, grounded on the reference
/// codebase's `cosine_similarity`/dedup-by-id ranking pattern. Adequate for
/// tests and the CLI demo; a production deployment would swap this adapter
/// for a real ANN-backed vector database behind the same [`VectorStore`]
/// trait.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<StoredVector>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        chunk_id: u32,
        vector: Vec<f32>,
        payload: ChunkPayload,
    ) -> Result<()> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = entries.iter_mut().find(|e| e.chunk_id == chunk_id) {
            existing.vector = vector;
            existing.payload = payload;
        } else {
            entries.push(StoredVector {
                chunk_id,
                vector,
                payload,
            });
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        profile_filter: ProfileId,
    ) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read().await;
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<SearchHit> = entries
            .iter()
            .filter(|e| e.payload.profile_id.matches_active(profile_filter))
            .map(|e| SearchHit {
                chunk_id: e.chunk_id,
                payload: e.payload.clone(),
                score: cosine_similarity(query, &e.vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.chunk_id.cmp(&b.chunk_id)));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete_by_payload_key(&self, collection: &str, payload_id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(entries) = collections.get_mut(collection) {
            entries.retain(|e| e.payload.payload_id != payload_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::{ContextId, ContextType};

    fn payload(id: i64) -> ChunkPayload {
        ChunkPayload {
            payload_id: format!("memory#{id}#full"),
            source_session_id: None,
            speaker: None,
            truth_type: ContextType::Memory,
            db_pk: ContextId::new(id),
            profile_id: ProfileId::new(1),
        }
    }

    #[tokio::test]
    async fn search_ranks_by_descending_cosine_similarity() {
        let store = InMemoryVectorStore::new();
        store
            .upsert("memories", 1, vec![1.0, 0.0, 0.0], payload(1))
            .await
            .unwrap();
        store
            .upsert("memories", 2, vec![0.0, 1.0, 0.0], payload(2))
            .await
            .unwrap();

        let hits = store
            .search("memories", &[0.9, 0.1, 0.0], 10, ProfileId::new(1))
            .await
            .unwrap();
        assert_eq!(hits[0].payload.db_pk, ContextId::new(1));
    }

    #[tokio::test]
    async fn search_respects_profile_filter() {
        let store = InMemoryVectorStore::new();
        let mut other_profile = payload(1);
        other_profile.profile_id = ProfileId::new(99);
        store.upsert("memories", 1, vec![1.0, 0.0], other_profile).await.unwrap();

        let hits = store.search("memories", &[1.0, 0.0], 10, ProfileId::new(1)).await.unwrap();
        assert!(hits.is_empty());
    }
}
