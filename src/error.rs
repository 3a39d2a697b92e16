//! Failure kinds for a single compilation run.
//!
//! Every stage returns one of these and the pipeline stops at the first one.
//! Messages are written to be shown to the user as-is.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The input bytes are not a readable zip archive
    #[error("Could not read the skill archive: {0}")]
    ArchiveFormat(String),

    /// No SKILL.MD (in any letter case) was found, or it had no usable text
    #[error("No primary instruction file found: {0}")]
    MissingPrimaryDocument(String),

    /// Transport, authentication, rate-limit or timeout failure from the model API
    #[error("Failed to communicate with the model API: {0:#}")]
    ModelInvocation(#[source] anyhow::Error),

    /// The model answered, but not with a command definition
    #[error("Model did not return a valid command definition: {0}")]
    MalformedResponse(String),

    /// The output archive could not be encoded or written
    #[error("Could not package the output archive: {0}")]
    ArchivePackaging(String),

    #[error("Invalid command name '{name}': {reason}")]
    InvalidCommandName { name: String, reason: String },

    #[error("Compilation was cancelled")]
    Cancelled,
}

impl From<zip::result::ZipError> for CompileError {
    fn from(err: zip::result::ZipError) -> Self {
        CompileError::ArchiveFormat(err.to_string())
    }
}
