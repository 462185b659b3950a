//! FlagEnricher: loads active-or-constant flags, ordered active-first then
//! by `lastUsedAt ∨ createdAt` descending.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weave_core::ConversationState;
use weave_store::ConversationStore;

use crate::traits::Enricher;

pub struct FlagEnricher {
    store: Arc<dyn ConversationStore>,
}

impl FlagEnricher {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Enricher for FlagEnricher {
    fn name(&self) -> &'static str {
        "flag"
    }

    async fn enrich(&self, state: &ConversationState, _cancel: &CancellationToken) -> anyhow::Result<()> {
        let mut flags = self.store.get_active_or_constant_flags(state.session.profile_id).await?;
        flags.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then_with(|| b.ordering_timestamp().cmp(&a.ordering_timestamp()))
        });
        *state.flags.lock().expect("flags mutex poisoned") = flags;
        Ok(())
    }
}
