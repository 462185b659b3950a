//! The shared, provider-agnostic request layout. Deterministic: given
//! identical state and configuration this always produces the same message
//! sequence.

use chrono::Utc;

use weave_core::{ContextData, ConversationState, ContextType, FlagId};
use weave_store::ConversationStore;

use crate::message::{BuiltRequest, Message};

/// The literal out-of-character preface. Wording is this implementation's
/// own choice, kept stable for determinism.
const OOC_PREFACE: &str = "[Out-of-character: the following is a meta-conversation aside, not part of the scene.]";

fn initial(name: &str, fallback: char) -> char {
    name.trim().chars().next().map(|c| c.to_ascii_uppercase()).unwrap_or(fallback)
}

fn grouped_header(ty: ContextType) -> &'static str {
    match ty {
        ContextType::Memory => "memories",
        ContextType::Insight => "insights",
        ContextType::PersonaVoiceSample => "voice sample",
        ContextType::Quote => "quotes",
        ContextType::CharacterProfile | ContextType::Generic => {
            unreachable!("not a grouped-message type")
        }
    }
}

fn sorted_grouped(mut items: Vec<ContextData>) -> Vec<ContextData> {
    items.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.get().cmp(&b.id.get())));
    items
}

fn sorted_individual(mut items: Vec<ContextData>) -> Vec<ContextData> {
    items.sort_by(|a, b| b.token_count.cmp(&a.token_count).then(a.id.get().cmp(&b.id.get())));
    items
}

fn append_grouped_block(request: &mut BuiltRequest, ty: ContextType, items: Vec<ContextData>) {
    if items.is_empty() {
        return;
    }
    let header = grouped_header(ty);
    let items = sorted_grouped(items);
    let body = items.iter().map(|item| item.content.clone()).collect::<Vec<_>>().join("\n\n");
    request.messages.push(Message::user(format!("`[meta] {header}`\n\n{body}")));
    request
        .messages
        .push(Message::assistant(format!("Received {} relevant {header} entries.", items.len())));
}

/// Builds the provider-agnostic request from `state`, and persists flag
/// deactivation for every flag actually read into the prompt — in the same
/// call, not deferred to commit.
pub async fn build(state: &ConversationState, store: &dyn ConversationStore) -> anyhow::Result<BuiltRequest> {
    let mut request = BuiltRequest::default();

    // 1. System prompt.
    request.system = state.persona.as_ref().map(|p| p.content.clone());

    // 2. User-profile block.
    if let Some(profile) = state.user_profile.lock().expect("user_profile mutex poisoned").clone() {
        let header = profile
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.to_lowercase())
            .unwrap_or_else(|| "user profile".to_string());
        request.messages.push(Message::user(format!("`[meta] {header}`\n\n{}", profile.content)));
        request.messages.push(Message::assistant("Acknowledging user profile."));
        request.mark_last_as_cache_breakpoint();
    }

    // 3. Individual-message types: Generic then CharacterProfile (isUser excluded).
    let generic = sorted_individual(state.generic_data.snapshot());
    let character_profiles: Vec<ContextData> = sorted_individual(
        state.character_profiles.snapshot().into_iter().filter(|item| !item.is_user).collect(),
    );
    let mut any_individual = false;
    for item in generic.into_iter().chain(character_profiles) {
        let header = item.header_name();
        request.messages.push(Message::user(format!("`[meta] {header}`\n\n{}", item.content)));
        request.messages.push(Message::assistant("Received."));
        any_individual = true;
    }
    if any_individual {
        request.mark_last_as_cache_breakpoint();
    }

    // 4. Grouped-message types: Memory, Insight, PersonaVoiceSample, Quote.
    append_grouped_block(&mut request, ContextType::Memory, state.memories.snapshot());
    if !state.memories.is_empty() {
        request.mark_last_as_cache_breakpoint();
    }
    append_grouped_block(&mut request, ContextType::Insight, state.insights.snapshot());
    if !state.insights.is_empty() {
        request.mark_last_as_cache_breakpoint();
    }
    append_grouped_block(&mut request, ContextType::PersonaVoiceSample, state.persona_voice_samples.snapshot());
    append_grouped_block(&mut request, ContextType::Quote, state.quotes.snapshot());

    // 5. Dialogue log.
    let dialogue_log = state.dialogue_log.lock().expect("dialogue_log mutex poisoned").clone();
    if !dialogue_log.is_empty() {
        request.messages.push(Message::user(dialogue_log));
        request.messages.push(Message::assistant("History noted."));
    }

    // 6. Recent turns.
    for turn in state.recent_turns.lock().expect("recent_turns mutex poisoned").iter() {
        let user_text = turn.serialized_request.clone().unwrap_or_else(|| turn.input.clone());
        request.messages.push(Message::user(user_text));
        if let Some(response) = &turn.response {
            if !response.trim().is_empty() {
                request.messages.push(Message::assistant(response.clone()));
            }
        }
    }

    // 7. Current prompt.
    if state.is_ooc {
        request
            .messages
            .push(Message::user(format!("{OOC_PREFACE}\n{}", state.current_turn.input)));
    } else {
        let flags = state.flags.lock().expect("flags mutex poisoned").clone();
        let user_name = state.user_name.lock().expect("user_name mutex poisoned").clone();
        let formatted_input = if user_name.trim().is_empty() {
            state.current_turn.input.clone()
        } else {
            format!("{}: {}", initial(&user_name, 'U'), state.current_turn.input)
        };

        let body = if flags.is_empty() {
            formatted_input
        } else {
            let flag_lines = flags.iter().map(|f| format!("- {}", f.value)).collect::<Vec<_>>().join("\n");
            format!("Flags:\n{flag_lines}\n\n{formatted_input}")
        };
        request.messages.push(Message::user(body));

        if !flags.is_empty() {
            let ids: Vec<FlagId> = flags.iter().map(|f| f.id).collect();
            store.deactivate_consumed_flags(&ids, Utc::now()).await?;
        }
    }

    Ok(request)
}
