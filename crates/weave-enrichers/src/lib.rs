pub mod always_on_manual;
pub mod dialogue_log;
pub mod flag;
pub mod perception;
pub mod semantic;
pub mod traits;
pub mod trigger;
pub mod turn_history;

pub use always_on_manual::{AlwaysOnManualEnricher, CharacterProfileEnricher};
pub use dialogue_log::DialogueLogEnricher;
pub use flag::FlagEnricher;
pub use perception::PerceptionEnricher;
pub use semantic::SemanticDataEnricher;
pub use traits::{Enricher, Orchestrator};
pub use trigger::TriggerEnricher;
pub use turn_history::TurnHistoryEnricher;

use std::sync::Arc;

use weave_config::AppConfig;
use weave_core::ContextType;
use weave_llm::ModelClient;
use weave_store::ConversationStore;
use weave_vector::VectorStore;

/// Assembles the full registered enricher set, wired against one
/// store/vector-store/model-client triple and one resolved configuration.
/// One call site (the pipeline) builds this once per turn.
pub fn build_enrichers(
    store: Arc<dyn ConversationStore>,
    vector_store: Arc<dyn VectorStore>,
    model: Arc<dyn ModelClient>,
    config: &AppConfig,
) -> Vec<Arc<dyn Enricher>> {
    let mut enrichers: Vec<Arc<dyn Enricher>> = vec![
        Arc::new(AlwaysOnManualEnricher::new(Arc::clone(&store), ContextType::Quote, true)),
        Arc::new(AlwaysOnManualEnricher::new(
            Arc::clone(&store),
            ContextType::PersonaVoiceSample,
            false,
        )),
        Arc::new(AlwaysOnManualEnricher::new(Arc::clone(&store), ContextType::Memory, true)),
        Arc::new(AlwaysOnManualEnricher::new(Arc::clone(&store), ContextType::Insight, true)),
        Arc::new(AlwaysOnManualEnricher::new(Arc::clone(&store), ContextType::Generic, true)),
        Arc::new(CharacterProfileEnricher::new(Arc::clone(&store))),
        Arc::new(TriggerEnricher::new(Arc::clone(&store))),
        Arc::new(SemanticDataEnricher::new(
            Arc::clone(&store),
            vector_store,
            Arc::clone(&model),
            config.clone(),
        )),
        Arc::new(TurnHistoryEnricher::new(Arc::clone(&store), config.previous_turns_count)),
        Arc::new(DialogueLogEnricher::new(
            Arc::clone(&store),
            config.previous_turns_count,
            config.max_dialogue_log_turns,
        )),
        Arc::new(FlagEnricher::new(Arc::clone(&store))),
        Arc::new(PerceptionEnricher::new(store, model, config.perception_enabled)),
    ];
    enrichers.shrink_to_fit();
    enrichers
}
