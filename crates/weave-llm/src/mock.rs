//! Deterministic `ModelClient` test/demo double. Avoids live network access
//! for unit tests and for the CLI demo front end, mirroring the way the
//! reference codebase's test suite never depends on a live provider.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::traits::{GenerateOutcome, ModelClient};

pub type GenerateFn =
    Arc<dyn Fn(&serde_json::Value, bool, Option<i64>) -> GenerateOutcome + Send + Sync>;

pub struct MockModelClient {
    generate: GenerateFn,
}

impl MockModelClient {
    pub fn new(generate: GenerateFn) -> Self {
        Self { generate }
    }

    /// A client that always succeeds with a fixed reply — useful when the
    /// test only cares about the request shape, not the response content.
    pub fn always_replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(Arc::new(move |_req, _technical, _turn| GenerateOutcome {
            success: true,
            text: text.clone(),
        }))
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn generate_content(
        &self,
        request: serde_json::Value,
        is_technical: bool,
        turn_id: Option<i64>,
    ) -> Result<GenerateOutcome> {
        Ok((self.generate)(&request, is_technical, turn_id))
    }

    async fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }

    async fn batch_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| deterministic_embedding(t, 8)).collect())
    }
}

/// A small, fully deterministic "embedding": byte-sum-derived features, not a
/// real semantic embedding. Adequate for exercising ranking/dedup logic in
/// tests without a live embedding backend.
fn deterministic_embedding(text: &str, dims: usize) -> Vec<f32> {
    let mut buckets = vec![0f32; dims];
    for (i, byte) in text.bytes().enumerate() {
        buckets[i % dims] += byte as f32;
    }
    let magnitude = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
    if magnitude == 0.0 {
        return buckets;
    }
    buckets.iter().map(|v| v / magnitude).collect()
}
