use anyhow::Result;
use async_trait::async_trait;

/// Outcome of a `generate_content` call: the dispatcher's
/// `execute(state) -> (success, text)` contract flows directly from this.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub success: bool,
    pub text: String,
}

/// Port for the external model-client transport: generate-content with a
/// tech/non-tech flag and optional turn-id tag; count-tokens; batch-embed
/// returning fixed-dimension float vectors.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// `request` is an already provider-shaped JSON body (built by
    /// `weave-promptbuilder`). `is_technical` distinguishes an internal
    /// analysis call (perception, query reformulation) from a user-facing
    /// turn; `turn_id` tags the call for logging/tracing when present.
    async fn generate_content(
        &self,
        request: serde_json::Value,
        is_technical: bool,
        turn_id: Option<i64>,
    ) -> Result<GenerateOutcome>;

    async fn count_tokens(&self, text: &str) -> Result<usize>;

    async fn batch_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
