pub mod builder;
pub mod claude;
pub mod gemini;
pub mod message;

pub use builder::build;
pub use message::{BuiltRequest, Message, Role};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use weave_config::AppConfig;
    use weave_core::{
        Availability, ContextData, ContextId, ContextType, ConversationState, Flag, FlagId,
        ProfileId, Session, SessionId, SystemMessage, SystemMessageKind, Turn, TurnId,
    };
    use weave_store::{ConversationStore, InMemoryStore};

    fn memory_item(id: i64, name: &str, content: &str) -> ContextData {
        ContextData {
            id: ContextId::new(id),
            profile_id: ProfileId::new(1),
            ty: ContextType::Memory,
            availability: Availability::AlwaysOn,
            name: Some(name.to_string()),
            content: content.to_string(),
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

    fn session_and_turn(input: &str) -> (Session, Turn) {
        let session = Session {
            id: SessionId::new(1),
            profile_id: ProfileId::new(1),
            active_persona_id: None,
            created_at: Utc::now(),
        };
        let turn = Turn::new_pending(TurnId::new(1), session.id, input.to_string(), Utc::now());
        (session, turn)
    }

    /// End-to-end scenario: one AlwaysOn memory, input "Hello".
    #[tokio::test]
    async fn scenario_one_always_on_memory_surfaces_in_memories_block() {
        let store = InMemoryStore::new();
        let (session, turn) = session_and_turn("Hello");
        let persona = SystemMessage {
            id: 1,
            profile_id: ProfileId::new(1),
            kind: SystemMessageKind::Persona,
            name: Some("Test".into()),
            content: "You are Test.".into(),
            is_active: true,
        };
        let state = ConversationState::new(session, turn, Some(persona));
        state.memories.insert(memory_item(1, "M1", "Always core"));

        let built = build(&state, &store).await.unwrap();
        let rendered: Vec<String> = built.messages.iter().map(|m| m.content.clone()).collect();

        let memories_idx = rendered.iter().position(|c| c.starts_with("`[meta] memories`")).unwrap();
        assert!(rendered[memories_idx].contains("Always core"));
        assert_eq!(rendered[memories_idx + 1], "Received 1 relevant memories entries.");
        assert!(rendered.last().unwrap().ends_with("Hello"));
    }

    /// End-to-end scenario: two enrichers inserting the same id.
    #[tokio::test]
    async fn scenario_four_duplicate_id_appears_exactly_once() {
        let store = InMemoryStore::new();
        let (session, turn) = session_and_turn("Hello");
        let state = ConversationState::new(session, turn, None);

        state.memories.insert(memory_item(7, "Shared", "unique content"));
        state.memories.insert(memory_item(7, "Shared", "duplicate content that should be dropped"));

        assert_eq!(state.memories.len(), 1);
        let built = build(&state, &store).await.unwrap();
        let occurrences = built
            .messages
            .iter()
            .filter(|m| m.content.contains("unique content"))
            .count();
        assert_eq!(occurrences, 1);
        assert!(built.messages.iter().all(|m| !m.content.contains("duplicate content")));
    }

    #[tokio::test]
    async fn ooc_input_skips_flags_and_uses_preface() {
        let store = InMemoryStore::new();
        let (session, turn) = session_and_turn("[ooc] let's talk meta");
        let state = ConversationState::new(session, turn, None);
        *state.flags.lock().unwrap() = vec![Flag {
            id: FlagId::new(1),
            value: "direction: be concise".into(),
            active: true,
            constant: false,
            last_used_at: None,
            created_at: Utc::now(),
            profile_id: ProfileId::new(1),
        }];

        let built = build(&state, &store).await.unwrap();
        let last = built.messages.last().unwrap();
        assert!(!last.content.contains("Flags:"));
        assert!(last.content.contains("[ooc] let's talk meta"));

        let flags = store.get_active_or_constant_flags(ProfileId::new(1)).await.unwrap();
        assert!(flags.is_empty(), "OOC input never registered a flag to begin with in this test");
    }

    #[tokio::test]
    async fn flags_read_into_the_prompt_are_deactivated_immediately() {
        let store = InMemoryStore::new();
        store
            .upsert_flag(Flag {
                id: FlagId::new(9),
                value: "be warm".into(),
                active: true,
                constant: false,
                last_used_at: None,
                created_at: Utc::now(),
                profile_id: ProfileId::new(1),
            })
            .await
            .unwrap();

        let (session, turn) = session_and_turn("How are you?");
        let state = ConversationState::new(session, turn, None);
        *state.flags.lock().unwrap() = vec![Flag {
            id: FlagId::new(9),
            value: "be warm".into(),
            active: true,
            constant: false,
            last_used_at: None,
            created_at: Utc::now(),
            profile_id: ProfileId::new(1),
        }];

        build(&state, &store).await.unwrap();

        let remaining = store.get_active_or_constant_flags(ProfileId::new(1)).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn empty_state_builds_with_only_current_prompt() {
        let store = InMemoryStore::new();
        let (session, turn) = session_and_turn("Just checking in");
        let state = ConversationState::new(session, turn, None);

        let built = build(&state, &store).await.unwrap();
        assert_eq!(built.messages.len(), 1);
        assert!(built.messages[0].content.contains("Just checking in"));
    }

    #[tokio::test]
    async fn provider_serialization_matches_scenario_five_cache_positions() {
        let store = InMemoryStore::new();
        let (session, turn) = session_and_turn("Hello");
        let state = ConversationState::new(session, turn, None);
        state.set_user_profile(memory_item(1, "Profile", "profile content"), "Sam".into());
        state.memories.insert(memory_item(2, "M", "a memory"));
        state.insights.insert(memory_item(3, "I", "an insight"));

        let built = build(&state, &store).await.unwrap();
        let breakpoint_contents: Vec<&str> = built
            .messages
            .iter()
            .filter(|m| m.cache_breakpoint)
            .map(|m| m.content.as_str())
            .collect();

        assert!(breakpoint_contents.contains(&"Acknowledging user profile."));
        assert!(breakpoint_contents.iter().any(|c| c.starts_with("Received 1 relevant memories")));
        assert!(breakpoint_contents.iter().any(|c| c.starts_with("Received 1 relevant insights")));

        let mut config = AppConfig::default();
        config.llm_provider = weave_config::LlmProvider::Claude;
        let claude_body = claude::serialize(&built, &config);
        let cache_controlled = claude_body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|m| m["content"][0].get("cache_control").is_some())
            .count();
        assert_eq!(cache_controlled, breakpoint_contents.len());

        let gemini_body = gemini::serialize(&built, &config);
        assert!(gemini_body.get("cache_control").is_none());
        assert_eq!(
            gemini_body["contents"].as_array().unwrap().len(),
            claude_body["messages"].as_array().unwrap().len()
        );
    }
}
