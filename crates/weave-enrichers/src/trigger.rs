//! TriggerEnricher: cross-cutting over Memory, Insight, CharacterProfile,
//! Generic. Delegates candidate lookup and keyword
//! matching to [`weave_contextitems::ContextItemService`]; this module owns
//! only the state-insertion and activation-recording side effects.

use std::sync::Arc;
use chrono::Utc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weave_core::{ConversationState, ContextType, TypedCollection};
use weave_contextitems::ContextItemService;
use weave_store::ConversationStore;

use crate::traits::Enricher;

fn collection_for<'a>(state: &'a ConversationState, ty: ContextType) -> &'a TypedCollection {
    match ty {
        ContextType::Memory => &state.memories,
        ContextType::Insight => &state.insights,
        ContextType::CharacterProfile => &state.character_profiles,
        ContextType::Generic => &state.generic_data,
        // Quote and PersonaVoiceSample are not valid (type, Trigger) combinations
        // per the validity matrix; candidates of those types never occur here.
        ContextType::Quote | ContextType::PersonaVoiceSample => &state.generic_data,
    }
}

pub struct TriggerEnricher {
    store: Arc<dyn ConversationStore>,
    items: ContextItemService,
}

impl TriggerEnricher {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        let items = ContextItemService::new(Arc::clone(&store));
        Self { store, items }
    }
}

#[async_trait]
impl Enricher for TriggerEnricher {
    fn name(&self) -> &'static str {
        "trigger"
    }

    async fn enrich(&self, state: &ConversationState, _cancel: &CancellationToken) -> anyhow::Result<()> {
        let profile_id = state.session.profile_id;
        let candidates = self.items.get_trigger_candidates(profile_id).await?;
        if candidates.is_empty() {
            return Ok(());
        }

        let activated = self
            .items
            .evaluate_triggers(state.session.id, &state.current_turn.input, candidates)
            .await?;

        let now = Utc::now();
        for item in activated {
            let id = item.id;
            let ty = item.ty;
            let newly_inserted = collection_for(state, ty).insert(item);
            if newly_inserted {
                self.store.record_trigger_activation(id, now).await?;
            }
        }
        Ok(())
    }
}
