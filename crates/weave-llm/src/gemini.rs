//! Gemini `ModelClient` adapter, generalized from the reference codebase's
//! `OllamaClient`/`OpenRouterClient` dual-provider HTTP router pattern
//! (`crates/llm/src/lib.rs`) to this crate's Gemini/Claude provider pair.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::traits::{GenerateOutcome, ModelClient};

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: "text-embedding-004".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate_content(
        &self,
        request: serde_json::Value,
        is_technical: bool,
        turn_id: Option<i64>,
    ) -> Result<GenerateOutcome> {
        tracing::debug!(provider = "gemini", is_technical, turn_id, "dispatching generate_content");
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("sending Gemini generateContent request")?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .context("decoding Gemini generateContent response")?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("unknown Gemini error");
            return Ok(GenerateOutcome {
                success: false,
                text: message.to_string(),
            });
        }

        let text = parse_gemini_text(&body).unwrap_or_default();
        Ok(GenerateOutcome {
            success: !text.trim().is_empty(),
            text,
        })
    }

    async fn count_tokens(&self, text: &str) -> Result<usize> {
        let url = format!(
            "{}/models/{}:countTokens?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .http
            .post(&url)
            .json(&json!({ "contents": [{ "parts": [{ "text": text }] }] }))
            .send()
            .await
            .context("sending Gemini countTokens request")?;
        let body: serde_json::Value = response.json().await.context("decoding Gemini countTokens response")?;
        body.get("totalTokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .ok_or_else(|| anyhow!("Gemini countTokens response missing totalTokens"))
    }

    async fn batch_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.base_url, self.embedding_model, self.api_key
        );
        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.embedding_model),
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect();
        let response = self
            .http
            .post(&url)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .context("sending Gemini batchEmbedContents request")?;
        let body: serde_json::Value = response
            .json()
            .await
            .context("decoding Gemini batchEmbedContents response")?;

        let embeddings = body
            .get("embeddings")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("Gemini batchEmbedContents response missing embeddings"))?;

        embeddings
            .iter()
            .map(|embedding| {
                embedding
                    .get("values")
                    .and_then(|v| v.as_array())
                    .map(|values| values.iter().filter_map(|v| v.as_f64()).map(|v| v as f32).collect())
                    .ok_or_else(|| anyhow!("embedding entry missing values"))
            })
            .collect()
    }
}

fn parse_gemini_text(body: &serde_json::Value) -> Option<String> {
    body.get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("")
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_content_extracts_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "hello there" }] } }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", "gemini-2.5-pro").with_base_url(server.uri());
        let outcome = client
            .generate_content(serde_json::json!({}), false, Some(1))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.text, "hello there");
    }

    #[tokio::test]
    async fn generate_content_reports_failure_on_error_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "bad request" }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", "gemini-2.5-pro").with_base_url(server.uri());
        let outcome = client
            .generate_content(serde_json::json!({}), false, None)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.text, "bad request");
    }
}
