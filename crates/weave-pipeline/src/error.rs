//! Pipeline-level error type. Only the two fatal categories —
//! configuration-missing and a failed commit write — ever reach the
//! caller; enrichment, dispatch, post-turn, and parse failures are all
//! handled internally and absorbed rather than propagated.

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("cancelled before the turn could be committed")]
    Cancelled,

    #[error("store operation failed: {0}")]
    Store(#[from] anyhow::Error),
}
