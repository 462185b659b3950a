use anyhow::Result;
use async_trait::async_trait;

use weave_core::{ContextId, ContextType, ProfileId, SessionId};

/// Payload carried alongside each indexed vector.
#[derive(Debug, Clone)]
pub struct ChunkPayload {
    pub payload_id: String,
    pub source_session_id: Option<SessionId>,
    pub speaker: Option<String>,
    pub truth_type: ContextType,
    /// The canonical `ContextData` id this chunk was derived from.
    pub db_pk: ContextId,
    pub profile_id: ProfileId,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk_id: u32,
    pub payload: ChunkPayload,
    pub score: f32,
}

/// Port for the external vector store. One logical collection per
/// semantic-eligible `ContextType`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn ensure_collection(&self, collection: &str) -> Result<()>;

    async fn upsert(
        &self,
        collection: &str,
        chunk_id: u32,
        vector: Vec<f32>,
        payload: ChunkPayload,
    ) -> Result<()>;

    /// Nearest-neighbor search with an optional scalar filter on profile id.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        profile_filter: ProfileId,
    ) -> Result<Vec<SearchHit>>;

    async fn delete_by_payload_key(&self, collection: &str, payload_id: &str) -> Result<()>;
}

pub fn collection_name(ty: ContextType) -> &'static str {
    match ty {
        ContextType::Quote => "quotes",
        ContextType::PersonaVoiceSample => "persona_voice_samples",
        ContextType::Memory => "memories",
        ContextType::Insight => "insights",
        ContextType::CharacterProfile => "character_profiles",
        ContextType::Generic => "generic_data",
    }
}
