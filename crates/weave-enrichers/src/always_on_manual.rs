//! AlwaysOn-and-Manual enrichers: one per supported data type. A single
//! generic struct covers Quote, Memory, Insight, Generic and (with
//! manual queries disabled) PersonaVoiceSample; `CharacterProfileEnricher`
//! is specialized because it additionally derives `state.userProfile` and
//! `state.userName`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weave_core::{ConversationState, ContextType, TypedCollection};
use weave_store::ConversationStore;

use crate::traits::Enricher;

fn collection_for<'a>(state: &'a ConversationState, ty: ContextType) -> &'a TypedCollection {
    match ty {
        ContextType::Quote => &state.quotes,
        ContextType::PersonaVoiceSample => &state.persona_voice_samples,
        ContextType::Memory => &state.memories,
        ContextType::Insight => &state.insights,
        ContextType::CharacterProfile => &state.character_profiles,
        ContextType::Generic => &state.generic_data,
    }
}

/// Generic AlwaysOn(-and-Manual) enricher, parameterized by the data type it
/// owns. `include_manual` is `false` for PersonaVoiceSample, which does not
/// query Manual.
pub struct AlwaysOnManualEnricher {
    store: Arc<dyn ConversationStore>,
    ty: ContextType,
    include_manual: bool,
}

impl AlwaysOnManualEnricher {
    pub fn new(store: Arc<dyn ConversationStore>, ty: ContextType, include_manual: bool) -> Self {
        Self { store, ty, include_manual }
    }
}

#[async_trait]
impl Enricher for AlwaysOnManualEnricher {
    fn name(&self) -> &'static str {
        match self.ty {
            ContextType::Quote => "always_on_manual:quote",
            ContextType::PersonaVoiceSample => "always_on_manual:persona_voice_sample",
            ContextType::Memory => "always_on_manual:memory",
            ContextType::Insight => "always_on_manual:insight",
            ContextType::CharacterProfile => "always_on_manual:character_profile",
            ContextType::Generic => "always_on_manual:generic",
        }
    }

    async fn enrich(&self, state: &ConversationState, _cancel: &CancellationToken) -> anyhow::Result<()> {
        let profile_id = state.session.profile_id;
        let collection = collection_for(state, self.ty);

        for item in self.store.get_always_on(profile_id, self.ty).await? {
            collection.insert(item);
        }
        if self.include_manual {
            for item in self.store.get_active_manual(profile_id, self.ty).await? {
                collection.insert(item);
            }
        }
        Ok(())
    }
}

/// Specialized CharacterProfileEnricher: on top of the usual AlwaysOn +
/// Manual query, sets `state.userProfile`/`state.userName` from the single
/// `isUser` profile.
pub struct CharacterProfileEnricher {
    store: Arc<dyn ConversationStore>,
}

impl CharacterProfileEnricher {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Enricher for CharacterProfileEnricher {
    fn name(&self) -> &'static str {
        "character_profile"
    }

    async fn enrich(&self, state: &ConversationState, _cancel: &CancellationToken) -> anyhow::Result<()> {
        let profile_id = state.session.profile_id;

        for item in self.store.get_always_on(profile_id, ContextType::CharacterProfile).await? {
            state.character_profiles.insert(item);
        }
        for item in self.store.get_active_manual(profile_id, ContextType::CharacterProfile).await? {
            state.character_profiles.insert(item);
        }

        if let Some(profile) = self.store.get_user_profile(profile_id).await? {
            let user_name = profile
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "User".to_string());
            state.set_user_profile(profile, user_name);
        }
        Ok(())
    }
}
