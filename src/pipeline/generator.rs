use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::archive::{read_archive, DEFAULT_MAX_EXTRACTED_BYTES};
use super::collector::collect_skill;
use super::compiler::PromptCompiler;
use super::context::serialize_context;
use super::normalizer::CompiledDocument;
use super::packager::{build_archive, validate_command_name, OutputArchive};
use crate::error::Result;

/// Where a caller's compile workflow currently stands.
///
/// A run starts `Idle` and ends in `Success` or `Error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompileStatus {
    #[default]
    Idle,
    Success { file_name: String },
    Error { message: String },
}

impl fmt::Display for CompileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileStatus::Idle => write!(f, "idle"),
            CompileStatus::Success { file_name } => write!(f, "success: {}", file_name),
            CompileStatus::Error { message } => write!(f, "error: {}", message),
        }
    }
}

/// Result of a successful run: the archive plus the document it carries.
#[derive(Debug, Clone)]
pub struct GeneratedCommand {
    pub document: CompiledDocument,
    pub archive: OutputArchive,
}

/// Runs archive → skill → context → model → document → output archive.
///
/// Each stage's error ends the run; nothing is retried and no partial
/// output is produced.
pub struct Generator {
    compiler: PromptCompiler,
    extract_limit: u64,
}

impl Generator {
    pub fn new(compiler: PromptCompiler) -> Self {
        Self {
            compiler,
            extract_limit: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }

    /// Cap on the total decompressed size of the input archive.
    pub fn with_extract_limit(mut self, max_bytes: u64) -> Self {
        self.extract_limit = max_bytes;
        self
    }

    pub async fn generate(
        &self,
        archive_bytes: &[u8],
        command_name: &str,
        cancel: &CancellationToken,
    ) -> Result<GeneratedCommand> {
        // Reject a bad name before spending a model call on it
        validate_command_name(command_name)?;

        info!("Reading skill archive ({} bytes)", archive_bytes.len());
        let entries = read_archive(archive_bytes, self.extract_limit)?;

        let skill = collect_skill(entries)?;
        let blob = serialize_context(&skill);
        drop(skill);

        let document = self.compiler.compile(&blob, cancel).await?;

        info!("Packaging command {}", command_name);
        let archive = build_archive(&document, command_name)?;

        Ok(GeneratedCommand { document, archive })
    }
}
