//! Error types for the sheetmend pipeline
//!
//! Only two conditions ever cross the pipeline boundary as errors: a
//! sanitizer rejection (so callers can branch and require explicit opt-in)
//! and a workbook that cannot be loaded or saved at all. Everything else —
//! engine unavailability, timeouts, individual repair failures — is
//! represented as data in the reports.

use thiserror::Error;

use crate::sanitize::SecurityError;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can propagate out of the pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// The sanitizer blocked a formula before it was written
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// Workbook model error
    #[error("Workbook error: {0}")]
    Core(#[from] sheetmend_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be loaded at all
    #[error("Failed to load workbook: {0}")]
    Load(String),

    /// The workbook could not be saved
    #[error("Failed to save workbook: {0}")]
    Save(String),
}
