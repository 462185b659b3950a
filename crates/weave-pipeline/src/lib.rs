pub mod error;
pub mod pipeline;
pub mod stripper;

pub use error::PipelineError;
pub use pipeline::{run_turn_uncancellable, ConversationPipeline};
pub use stripper::PostTurnStripper;
