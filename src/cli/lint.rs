use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use zip::ZipArchive;

use crate::lint::{error_count, CommandLinter};
use crate::pipeline::packager::COMMAND_FILE_NAME;

/// Load the command definition from a `.toml` file or a compiled `.zip`.
fn load_command(file: &Path) -> Result<String> {
    let is_zip = file
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

    if !is_zip {
        return fs::read_to_string(file).with_context(|| format!("Cannot read {}", file.display()));
    }

    let bytes = fs::read(file).with_context(|| format!("Cannot read {}", file.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .with_context(|| format!("{} is not a valid zip archive", file.display()))?;
    let mut member = archive
        .by_name(COMMAND_FILE_NAME)
        .with_context(|| format!("{} has no {}", file.display(), COMMAND_FILE_NAME))?;
    let mut content = String::new();
    member
        .read_to_string(&mut content)
        .with_context(|| format!("{} in {} is not UTF-8", COMMAND_FILE_NAME, file.display()))?;
    Ok(content)
}

pub fn run(path: &str) -> Result<()> {
    let file = Path::new(path);
    if !file.exists() {
        bail!("File not found: {}", path);
    }
    if !file.is_file() {
        bail!("Path is not a file: {}", path);
    }

    let content = load_command(file)?;
    let linter = CommandLinter::new();
    let issues = linter.lint(&content);

    linter.print_issues(&issues);

    let errors = error_count(&issues);
    if errors > 0 {
        bail!("{} lint error(s) found", errors);
    }

    Ok(())
}
