//! Dispatcher: selects a provider strategy from `LLMProvider`, calls
//! `execute(state)` returning `(success, text)`, and propagates cancellation.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weave_config::{AppConfig, LlmProvider};
use weave_llm::ModelClient;

#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    async fn execute(
        &self,
        request: serde_json::Value,
        turn_id: i64,
        cancel: &CancellationToken,
    ) -> Result<(bool, String)>;
}

async fn execute_with_cancellation(
    model: &dyn ModelClient,
    request: serde_json::Value,
    turn_id: i64,
    cancel: &CancellationToken,
) -> Result<(bool, String)> {
    tokio::select! {
        _ = cancel.cancelled() => Err(anyhow!("dispatch cancelled")),
        outcome = model.generate_content(request, false, Some(turn_id)) => {
            let outcome = outcome?;
            Ok((outcome.success, outcome.text))
        }
    }
}

pub struct GeminiStrategy {
    model: Arc<dyn ModelClient>,
}

impl GeminiStrategy {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl DispatchStrategy for GeminiStrategy {
    async fn execute(&self, request: serde_json::Value, turn_id: i64, cancel: &CancellationToken) -> Result<(bool, String)> {
        execute_with_cancellation(self.model.as_ref(), request, turn_id, cancel).await
    }
}

pub struct ClaudeStrategy {
    model: Arc<dyn ModelClient>,
}

impl ClaudeStrategy {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl DispatchStrategy for ClaudeStrategy {
    async fn execute(&self, request: serde_json::Value, turn_id: i64, cancel: &CancellationToken) -> Result<(bool, String)> {
        execute_with_cancellation(self.model.as_ref(), request, turn_id, cancel).await
    }
}

/// Selects the dispatch strategy named by `config.llm_provider`.
pub fn select_strategy(config: &AppConfig, model: Arc<dyn ModelClient>) -> Box<dyn DispatchStrategy> {
    match config.llm_provider {
        LlmProvider::Gemini => Box::new(GeminiStrategy::new(model)),
        LlmProvider::Claude => Box::new(ClaudeStrategy::new(model)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_llm::MockModelClient;

    #[tokio::test]
    async fn selects_gemini_strategy_by_default() {
        let config = AppConfig::default();
        let model = Arc::new(MockModelClient::always_replying("ack"));
        let strategy = select_strategy(&config, model);
        let (success, text) = strategy.execute(serde_json::json!({}), 1, &CancellationToken::new()).await.unwrap();
        assert!(success);
        assert_eq!(text, "ack");
    }

    #[tokio::test]
    async fn cancelling_before_dispatch_surfaces_as_an_error() {
        let config = AppConfig::default();
        let model = Arc::new(MockModelClient::always_replying("ack"));
        let strategy = select_strategy(&config, model);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = strategy.execute(serde_json::json!({}), 1, &cancel).await;
        assert!(result.is_err());
    }
}
