//! Indexing: a context item is indexed as one to three chunks.

use weave_core::ContextData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Full,
    Semantic,
    Relevance,
}

impl ChunkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Full => "full",
            ChunkKind::Semantic => "semantic",
            ChunkKind::Relevance => "relevance",
        }
    }
}

pub struct Chunk {
    pub kind: ChunkKind,
    pub text: String,
    /// Deterministic integer id derived by stable hash of `text`.
    pub chunk_id: u32,
    /// `"{type}#{itemId}#{chunkKind}"` — the payload-id string.
    pub payload_id: String,
}

/// FNV-1a 32-bit hash. Deterministic and fixed across runs — the stable
/// hash used for chunk ids must not drift between versions.
pub fn stable_hash_u32(text: &str) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;
    let mut hash = FNV_OFFSET_BASIS;
    for byte in text.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Build the one-to-three chunks for `item`: always a "full" chunk; a
/// "semantic" chunk prefixed with the joined tag list when tags are present;
/// a "relevance" chunk prefixed with the relevance reason when one exists.
///
/// The relevance reason is not a first-class `ContextData` field — it is
/// modeled here as an optional caller-supplied string, since its source is
/// otherwise unspecified beyond "a relevance reason".
pub fn build_chunks(item: &ContextData, relevance_reason: Option<&str>) -> Vec<Chunk> {
    let type_name = item.ty.type_name_lower();
    let mut chunks = Vec::with_capacity(3);

    let full_text = item.content.clone();
    chunks.push(make_chunk(ChunkKind::Full, full_text, type_name, item.id.get()));

    if !item.tags.is_empty() {
        let semantic_text = format!("{}\n\n{}", item.tags.join(", "), item.content);
        chunks.push(make_chunk(ChunkKind::Semantic, semantic_text, type_name, item.id.get()));
    }

    if let Some(reason) = relevance_reason {
        if !reason.trim().is_empty() {
            let relevance_text = format!("{reason}\n\n{}", item.content);
            chunks.push(make_chunk(ChunkKind::Relevance, relevance_text, type_name, item.id.get()));
        }
    }

    chunks
}

fn make_chunk(kind: ChunkKind, text: String, type_name: &str, item_id: i64) -> Chunk {
    let payload_id = format!("{type_name}#{item_id}#{}", kind.as_str());
    let chunk_id = stable_hash_u32(&format!("{payload_id}:{text}"));
    Chunk {
        kind,
        text,
        chunk_id,
        payload_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::{Availability, ContextId, ContextType, ProfileId};

    fn sample() -> ContextData {
        ContextData {
            id: ContextId::new(42),
            profile_id: ProfileId::new(1),
            ty: ContextType::Memory,
            availability: Availability::Semantic,
            name: Some("M".into()),
            content: "the user likes rain".into(),
            speaker: None,
            source_session_id: None,
            tags: vec!["weather".into(), "mood".into()],
            sort_order: 0,
            token_count: 0,
            vector_id: None,
            in_vector_db: false,
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

    #[test]
    fn builds_full_and_semantic_chunks_when_tags_present() {
        let item = sample();
        let chunks = build_chunks(&item, None);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].kind, ChunkKind::Full);
        assert_eq!(chunks[0].payload_id, "memory#42#full");
        assert_eq!(chunks[1].kind, ChunkKind::Semantic);
        assert_eq!(chunks[1].payload_id, "memory#42#semantic");
    }

    #[test]
    fn chunk_ids_are_stable_across_calls() {
        let item = sample();
        let first = build_chunks(&item, None);
        let second = build_chunks(&item, None);
        assert_eq!(first[0].chunk_id, second[0].chunk_id);
    }

    #[test]
    fn relevance_chunk_only_appears_when_reason_given() {
        let item = sample();
        let without = build_chunks(&item, None);
        assert!(without.iter().all(|c| c.kind != ChunkKind::Relevance));

        let with = build_chunks(&item, Some("matched because of recency"));
        assert!(with.iter().any(|c| c.kind == ChunkKind::Relevance));
    }
}
