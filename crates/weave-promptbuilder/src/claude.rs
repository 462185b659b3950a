//! Claude-shaped serialization: cache breakpoints become `cache_control`
//! blocks, plus max-tokens/temperature/model/extended-thinking stamps from
//! configuration.

use weave_config::AppConfig;

use crate::message::{BuiltRequest, Role};

pub fn serialize(request: &BuiltRequest, config: &AppConfig) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            let mut content_block = serde_json::json!({ "type": "text", "text": message.content });
            if message.cache_breakpoint && config.enable_prompt_caching {
                content_block["cache_control"] = serde_json::json!({ "type": "ephemeral" });
            }
            serde_json::json!({ "role": role, "content": [content_block] })
        })
        .collect();

    let mut body = serde_json::json!({
        "model": config.claude_model,
        "max_tokens": config.claude_max_tokens,
        "temperature": config.claude_temperature,
        "messages": messages,
    });

    if let Some(system) = &request.system {
        body["system"] = serde_json::Value::String(system.clone());
    }
    if let Some(budget) = config.claude_extended_thinking_budget_tokens {
        body["thinking"] = serde_json::json!({ "type": "enabled", "budget_tokens": budget });
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn cache_breakpoints_become_cache_control_blocks() {
        let mut request = BuiltRequest::default();
        request.messages.push(Message::user("a").with_cache_breakpoint());
        request.messages.push(Message::assistant("b"));

        let config = AppConfig::default();
        let body = serialize(&request, &config);
        assert!(body["messages"][0]["content"][0]["cache_control"].is_object());
        assert!(body["messages"][1]["content"][0].get("cache_control").is_none());
    }

    #[test]
    fn disabling_prompt_caching_drops_cache_control_blocks() {
        let mut request = BuiltRequest::default();
        request.messages.push(Message::user("a").with_cache_breakpoint());

        let mut config = AppConfig::default();
        config.enable_prompt_caching = false;
        let body = serialize(&request, &config);
        assert!(body["messages"][0]["content"][0].get("cache_control").is_none());
    }
}
