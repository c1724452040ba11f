//! Error types for the recalculation bridge.
//!
//! Every variant here is recoverable from the orchestrator's point of view:
//! a failed external attempt degrades to the static validator, it never
//! aborts the pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecalcError {
    #[error("Recalculation engine not found: '{0}'. Install it and ensure it is in PATH.")]
    EngineNotFound(String),

    #[error("Failed to spawn recalculation engine: {0}")]
    SpawnFailed(std::io::Error),

    #[error("Recalculation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Recalculation engine exited ({0}) without producing output")]
    EngineExited(String),

    #[error("Malformed recalculation output: {0}")]
    MalformedOutput(String),

    #[error("Failed to parse recalculation output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecalcError>;
