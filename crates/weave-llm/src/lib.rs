pub mod claude;
pub mod gemini;
pub mod json_extract;
pub mod mock;
pub mod traits;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use json_extract::{extract_json, extract_json_array};
pub use mock::MockModelClient;
pub use traits::{GenerateOutcome, ModelClient};
