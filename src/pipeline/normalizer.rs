use std::fmt;

use crate::error::{CompileError, Result};

/// Literal that marks the start of the command definition in a model response.
pub const ANCHOR: &str = "description =";

const CLOSING_FENCE: &str = "```";

/// Command definition text cut out of a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument(String);

impl CompiledDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompiledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cut the command definition out of a raw model response.
///
/// Everything before the first `description =` is dropped, as is a trailing
/// markdown fence. The result ends with exactly one newline. The TOML itself
/// is not parsed here.
pub fn extract_document(raw: &str) -> Result<CompiledDocument> {
    let start = raw.find(ANCHOR).ok_or_else(|| {
        CompileError::MalformedResponse(format!(
            "the `{}` anchor was not found in the response",
            ANCHOR
        ))
    })?;

    let mut body = raw[start..].trim();
    if let Some(stripped) = body.strip_suffix(CLOSING_FENCE) {
        body = stripped.trim();
    }

    Ok(CompiledDocument(format!("{}\n", body)))
}
