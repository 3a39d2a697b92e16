use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::normalizer::CompiledDocument;
use crate::error::{CompileError, Result};

/// Member name of the command definition inside the output archive.
pub const COMMAND_FILE_NAME: &str = "command.toml";
/// Member name of the usage guide inside the output archive.
pub const README_FILE_NAME: &str = "README.md";

/// Finished zip archive, ready to be handed to the user.
#[derive(Debug, Clone)]
pub struct OutputArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Check a command name like `/my-skill`.
///
/// It must start with `/`, have something after it, and contain no whitespace
/// or path separators, since it also names the archive.
pub fn validate_command_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| CompileError::InvalidCommandName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let bare = name
        .strip_prefix('/')
        .ok_or_else(|| invalid("must start with '/'"))?;
    if bare.is_empty() {
        return Err(invalid("needs a name after '/'"));
    }
    if bare.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(invalid("must not contain whitespace or path separators"));
    }
    Ok(())
}

fn bare_name(command_name: &str) -> &str {
    command_name.trim_start_matches('/')
}

/// Usage guide shipped next to the command definition.
pub fn render_readme(command_name: &str) -> String {
    let bare = bare_name(command_name);
    format!(
        r#"# Gemini CLI command: {command_name}

This archive was compiled from a Claude Skill. It contains:

- `{command_file}`: the command definition (`description` and `prompt`).
- `{readme_file}`: this guide.

## Install

Gemini CLI names a custom command after its file. Copy the definition into a
commands directory under the name `{bare}.toml`:

```sh
# available in every project
mkdir -p ~/.gemini/commands
cp {command_file} ~/.gemini/commands/{bare}.toml

# or only in the current project
mkdir -p .gemini/commands
cp {command_file} .gemini/commands/{bare}.toml
```

Restart Gemini CLI so it picks up the new command.

## Use

```
{command_name} <what you want done>
```

Everything after the command name is passed to the prompt as the user's request.
"#,
        command_name = command_name,
        bare = bare,
        command_file = COMMAND_FILE_NAME,
        readme_file = README_FILE_NAME,
    )
}

fn packaging_error(err: impl std::fmt::Display) -> CompileError {
    CompileError::ArchivePackaging(err.to_string())
}

/// Package the document and usage guide into a zip named after the command.
pub fn build_archive(document: &CompiledDocument, command_name: &str) -> Result<OutputArchive> {
    validate_command_name(command_name)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    writer
        .start_file(COMMAND_FILE_NAME, options)
        .map_err(packaging_error)?;
    writer
        .write_all(document.as_str().as_bytes())
        .map_err(packaging_error)?;

    writer
        .start_file(README_FILE_NAME, options)
        .map_err(packaging_error)?;
    writer
        .write_all(render_readme(command_name).as_bytes())
        .map_err(packaging_error)?;

    let bytes = writer.finish().map_err(packaging_error)?.into_inner();

    Ok(OutputArchive {
        file_name: format!("{}.zip", bare_name(command_name)),
        bytes,
    })
}

/// Write the archive into `dir`, returning the file's path.
pub fn deliver(archive: &OutputArchive, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        CompileError::ArchivePackaging(format!("cannot create {}: {}", dir.display(), e))
    })?;

    let path = dir.join(&archive.file_name);
    fs::write(&path, &archive.bytes).map_err(|e| {
        CompileError::ArchivePackaging(format!("cannot write {}: {}", path.display(), e))
    })?;

    info!("Wrote {} ({} bytes)", path.display(), archive.bytes.len());
    Ok(path)
}
