//! Claude `ModelClient` adapter, generalized from the reference codebase's
//! dual-provider HTTP router pattern (`crates/llm/src/lib.rs`).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use crate::traits::{GenerateOutcome, ModelClient};

pub struct ClaudeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ModelClient for ClaudeClient {
    async fn generate_content(
        &self,
        mut request: serde_json::Value,
        is_technical: bool,
        turn_id: Option<i64>,
    ) -> Result<GenerateOutcome> {
        tracing::debug!(provider = "claude", is_technical, turn_id, "dispatching generate_content");
        if let Some(obj) = request.as_object_mut() {
            obj.entry("model").or_insert_with(|| self.model.clone().into());
            obj.entry("max_tokens").or_insert_with(|| 4096.into());
        }

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .context("sending Claude messages request")?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.context("decoding Claude messages response")?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("unknown Claude error");
            return Ok(GenerateOutcome {
                success: false,
                text: message.to_string(),
            });
        }

        let text = parse_claude_text(&body).unwrap_or_default();
        Ok(GenerateOutcome {
            success: !text.trim().is_empty(),
            text,
        })
    }

    async fn count_tokens(&self, text: &str) -> Result<usize> {
        let response = self
            .http
            .post(format!("{}/messages/count_tokens", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": text }],
            }))
            .send()
            .await
            .context("sending Claude count_tokens request")?;
        let body: serde_json::Value = response.json().await.context("decoding Claude count_tokens response")?;
        body.get("input_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .ok_or_else(|| anyhow!("Claude count_tokens response missing input_tokens"))
    }

    async fn batch_embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(anyhow!(
            "embedding generation is not offered by the Claude provider; configure the Gemini provider for semantic search"
        ))
    }
}

fn parse_claude_text(body: &serde_json::Value) -> Option<String> {
    body.get("content")?
        .as_array()?
        .iter()
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("")
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_content_extracts_message_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{ "type": "text", "text": "ack" }]
            })))
            .mount(&server)
            .await;

        let client = ClaudeClient::new("key", "claude-sonnet-4-5").with_base_url(server.uri());
        let outcome = client
            .generate_content(serde_json::json!({ "messages": [] }), false, None)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.text, "ack");
    }

    #[tokio::test]
    async fn batch_embed_is_unsupported() {
        let client = ClaudeClient::new("key", "claude-sonnet-4-5");
        let result = client.batch_embed(&["hello".to_string()]).await;
        assert!(result.is_err());
    }
}
