//! Gemini-shaped serialization: cache breakpoints are silently dropped;
//! safety-filter configuration is attached when provided.

use weave_config::AppConfig;

use crate::message::{BuiltRequest, Role};

pub fn serialize(request: &BuiltRequest, config: &AppConfig) -> serde_json::Value {
    let contents: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            serde_json::json!({
                "role": role,
                "parts": [{ "text": message.content }],
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "model": config.gemini_model,
        "contents": contents,
    });

    if let Some(system) = &request.system {
        body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
    }
    if let Some(safety_settings) = &config.gemini_safety_settings {
        body["safetySettings"] = safety_settings.clone();
    }

    body
}
