//! PerceptionEnricher: runs every active Perception system message through a
//! technical LLM call and harvests `(property, explanation)` records from the
//! (permissively parsed) response.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use weave_core::{ConversationState, PerceptionRecord};
use weave_llm::{extract_json_array, ModelClient};
use weave_store::ConversationStore;

use crate::traits::Enricher;

pub struct PerceptionEnricher {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ModelClient>,
    enabled: bool,
}

impl PerceptionEnricher {
    pub fn new(store: Arc<dyn ConversationStore>, model: Arc<dyn ModelClient>, enabled: bool) -> Self {
        Self { store, model, enabled }
    }
}

#[derive(Debug, Deserialize)]
struct RawPerception {
    property: String,
    explanation: String,
}

fn initial(name: &str, fallback: char) -> char {
    name.trim().chars().next().map(|c| c.to_ascii_uppercase()).unwrap_or(fallback)
}

/// `"{personaInitial}: {previousResponse}\n{userInitial}: {currentInput}"`,
/// with either line dropped when its text field is blank.
fn build_payload(persona_name: &str, user_name: &str, previous_response: &str, current_input: &str) -> String {
    let persona_initial = initial(persona_name, 'A');
    let user_initial = initial(user_name, 'U');

    let mut lines = Vec::with_capacity(2);
    if !previous_response.trim().is_empty() {
        lines.push(format!("{persona_initial}: {previous_response}"));
    }
    if !current_input.trim().is_empty() {
        lines.push(format!("{user_initial}: {current_input}"));
    }
    lines.join("\n")
}

#[async_trait]
impl Enricher for PerceptionEnricher {
    fn name(&self) -> &'static str {
        "perception"
    }

    async fn enrich(&self, state: &ConversationState, cancel: &CancellationToken) -> anyhow::Result<()> {
        if !self.enabled || state.current_turn.input.trim().is_empty() {
            return Ok(());
        }

        let prompts = self.store.get_active_perception_prompts(state.session.profile_id).await?;
        if prompts.is_empty() {
            return Ok(());
        }

        let previous_response = state.previous_response.lock().expect("previous_response mutex poisoned").clone();
        let user_name = state.user_name.lock().expect("user_name mutex poisoned").clone();
        let payload = build_payload(&state.persona_name, &user_name, &previous_response, &state.current_turn.input);

        for prompt in prompts {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let request = serde_json::json!({
                "system": prompt.content,
                "messages": [{ "role": "user", "content": payload }],
            });

            let outcome = match self
                .model
                .generate_content(request, true, Some(state.current_turn.id.get()))
                .await
            {
                Ok(outcome) if outcome.success => outcome,
                Ok(_) => continue,
                Err(error) => {
                    tracing::warn!(%error, prompt_id = prompt.id, "perception LLM call failed, skipping prompt");
                    continue;
                }
            };

            let Some(records) = extract_json_array::<RawPerception>(&outcome.text) else {
                continue;
            };
            for record in records {
                state.perceptions.insert(PerceptionRecord {
                    property: record.property,
                    explanation: record.explanation,
                });
            }
        }
        Ok(())
    }
}
