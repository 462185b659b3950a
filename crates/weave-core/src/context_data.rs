use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContextId, ProfileId, SessionId, TurnId};
use crate::types::{Availability, ContextType};

/// Unified entity representing every piece of auxiliary context: character
/// sheets, memories, insights, voice samples, dialogue quotes, and generic
/// data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextData {
    pub id: ContextId,
    pub profile_id: ProfileId,

    pub ty: ContextType,
    pub availability: Availability,

    pub name: Option<String>,
    pub content: String,
    pub speaker: Option<String>,
    pub source_session_id: Option<SessionId>,
    pub tags: Vec<String>,
    pub sort_order: i64,
    pub token_count: i64,

    pub vector_id: Option<String>,
    pub in_vector_db: bool,
    pub embedding_updated_at: Option<DateTime<Utc>>,

    pub use_every_turn: bool,
    pub use_next_turn_only: bool,
    pub previous_availability: Option<Availability>,

    pub trigger_keywords: Option<String>,
    pub trigger_min_match_count: i64,
    pub trigger_lookback_turns: i64,

    pub is_enabled: bool,
    pub is_archived: bool,
    pub is_user: bool,

    pub used_last_on_turn_id: Option<TurnId>,
    pub relevance_score: Option<f32>,
    pub process_weight: Option<f32>,
}

impl ContextData {
    /// `true` when this item should never be returned by any read path,
    /// regardless of what filter is being applied: archived items never
    /// appear in any turn's state.
    pub fn is_archived_or_disabled(&self) -> bool {
        self.is_archived || !self.is_enabled
    }

    /// Lower-cased message header: the item's own name if present, else the
    /// type's lower-cased name.
    pub fn header_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.to_lowercase(),
            _ => self.ty.type_name_lower().to_string(),
        }
    }

    /// Parsed, trimmed, non-empty trigger keywords from the comma-separated
    /// `triggerKeywords` field.
    pub fn trigger_keyword_list(&self) -> Vec<String> {
        self.trigger_keywords
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn default_trigger_min_match_count() -> i64 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContextData {
        ContextData {
            id: ContextId::new(1),
            profile_id: ProfileId::new(1),
            ty: ContextType::Memory,
            availability: Availability::AlwaysOn,
            name: None,
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
            trigger_keywords: None,
            trigger_min_match_count: ContextData::default_trigger_min_match_count(),
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
    fn header_name_falls_back_to_type_name() {
        let item = sample();
        assert_eq!(item.header_name(), "memory");
    }

    #[test]
    fn header_name_uses_lowercased_own_name() {
        let mut item = sample();
        item.name = Some("M1 Title".into());
        assert_eq!(item.header_name(), "m1 title");
    }

    #[test]
    fn trigger_keyword_list_trims_and_lowercases() {
        let mut item = sample();
        item.trigger_keywords = Some(" Weather, Rain ,rain".into());
        assert_eq!(
            item.trigger_keyword_list(),
            vec!["weather".to_string(), "rain".to_string(), "rain".to_string()]
        );
    }
}
