use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// `LLMProvider` setting: selects which provider strategy the dispatcher uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum LlmProvider {
    Gemini,
    Claude,
}

impl Default for LlmProvider {
    fn default() -> Self {
        LlmProvider::Gemini
    }
}

/// Per-type semantic-search token quotas
/// (`SemanticTokenQuota_{Quote,Memory,Insight,PersonaVoiceSample}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticTokenQuotas {
    pub quote: i64,
    pub memory: i64,
    pub insight: i64,
    pub persona_voice_sample: i64,
}

impl Default for SemanticTokenQuotas {
    fn default() -> Self {
        Self {
            quote: 1000,
            memory: 1000,
            insight: 1000,
            persona_voice_sample: 1000,
        }
    }
}

/// Top-level application configuration, one field per tunable knob, loaded
/// from TOML with `#[serde(default)]` on every field so a partial config file
/// still produces a valid `AppConfig` (the reference codebase's configuration
/// crate follows the same pattern for its per-feature sub-configs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub previous_turns_count: u32,
    pub max_dialogue_log_turns: u32,
    pub perception_enabled: bool,
    pub llm_provider: LlmProvider,
    pub gemini_model: String,
    pub claude_model: String,
    pub semantic_token_quota: SemanticTokenQuotas,
    pub semantic_use_llm_query_transformation: bool,
    pub quotes_max_length: i64,
    pub trigger_scan_text_additional_words: u32,
    pub active_persona_id: Option<i64>,
    /// Ambient knob for the Claude-specific cache-breakpoint/extended-thinking
    /// adaptation.
    pub enable_prompt_caching: bool,
    /// Bounded concurrency for the background post-turn-stripper worker.
    pub post_turn_stripper_concurrency: usize,

    /// Ambient Claude request-shaping knobs: max-tokens, temperature, model
    /// name, and an optional extended thinking budget.
    pub claude_max_tokens: i64,
    pub claude_temperature: f32,
    pub claude_extended_thinking_budget_tokens: Option<i64>,

    /// Ambient Gemini request-shaping knob: safety-filter configuration,
    /// attached to the request if provided.
    pub gemini_safety_settings: Option<serde_json::Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            previous_turns_count: 6,
            max_dialogue_log_turns: 50,
            perception_enabled: true,
            llm_provider: LlmProvider::default(),
            gemini_model: "gemini-2.5-pro".to_string(),
            claude_model: "claude-sonnet-4-5".to_string(),
            semantic_token_quota: SemanticTokenQuotas::default(),
            semantic_use_llm_query_transformation: false,
            quotes_max_length: 2000,
            trigger_scan_text_additional_words: 0,
            active_persona_id: None,
            enable_prompt_caching: true,
            post_turn_stripper_concurrency: 20,
            claude_max_tokens: 4096,
            claude_temperature: 1.0,
            claude_extended_thinking_budget_tokens: None,
            gemini_safety_settings: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file. Fails fast if the file cannot be
    /// read or parsed — there is no silent fallback to defaults for an
    /// unreadable file, though missing individual keys within a readable file
    /// do fall back to their documented defaults via `#[serde(default)]`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file at {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing configuration file at {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let rendered = toml::to_string_pretty(self).context("serializing configuration")?;
        std::fs::write(path, rendered)
            .with_context(|| format!("writing configuration file at {}", path.display()))?;
        Ok(())
    }

    /// The model name for the currently selected provider.
    pub fn active_model(&self) -> &str {
        match self.llm_provider {
            LlmProvider::Gemini => &self.gemini_model,
            LlmProvider::Claude => &self.claude_model,
        }
    }

    pub fn semantic_quota_for(&self, ty: weave_core::ContextType) -> i64 {
        use weave_core::ContextType::*;
        match ty {
            Quote => self.semantic_token_quota.quote,
            Memory => self.semantic_token_quota.memory,
            Insight => self.semantic_token_quota.insight,
            PersonaVoiceSample => self.semantic_token_quota.persona_voice_sample,
            CharacterProfile | Generic => 0,
        }
    }
}
