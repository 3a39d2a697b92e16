use tracing::{info, warn};

use super::archive::RawArchiveEntry;
use crate::error::{CompileError, Result};

/// Canonical file name of the skill's instruction document, matched ignoring case.
pub const PRIMARY_FILE_NAME: &str = "SKILL.MD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillResource {
    pub path: String,
    pub content: String,
}

/// A skill bundle split into its instruction document and supporting files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillSourceData {
    pub primary_path: String,
    pub primary_document: String,
    /// Archive order, primary document excluded
    pub resources: Vec<SkillResource>,
}

impl SkillSourceData {
    pub fn resource(&self, path: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.content.as_str())
    }

    pub fn resource_paths(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|r| r.path.as_str())
    }
}

/// Last path component, so `my-skill/SKILL.md` is recognised as well as `SKILL.md`.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_primary_candidate(path: &str) -> bool {
    file_name(path).eq_ignore_ascii_case(PRIMARY_FILE_NAME)
}

/// Classify decoded archive entries into a [`SkillSourceData`].
///
/// The first entry named `SKILL.MD` (any case) is the primary document. Other
/// entries become resources; those that are not valid UTF-8 are skipped with a
/// warning so the context blob only ever holds text.
pub fn collect_skill(entries: Vec<RawArchiveEntry>) -> Result<SkillSourceData> {
    let primary_index = entries
        .iter()
        .position(|e| is_primary_candidate(&e.path))
        .ok_or_else(|| {
            CompileError::MissingPrimaryDocument(format!(
                "the archive has no file named {} ({} file(s) inspected)",
                PRIMARY_FILE_NAME,
                entries.len()
            ))
        })?;

    let mut primary_path = String::new();
    let mut primary_document = String::new();
    let mut resources = Vec::with_capacity(entries.len().saturating_sub(1));

    for (index, entry) in entries.into_iter().enumerate() {
        if index == primary_index {
            primary_path = entry.path;
            primary_document = String::from_utf8(entry.content).map_err(|_| {
                CompileError::MissingPrimaryDocument(format!(
                    "{} is not valid UTF-8 text",
                    primary_path
                ))
            })?;
            continue;
        }

        if is_primary_candidate(&entry.path) {
            warn!(
                "Additional instruction file {} kept as a resource (using the first one found)",
                entry.path
            );
        }

        match String::from_utf8(entry.content) {
            Ok(content) => resources.push(SkillResource {
                path: entry.path,
                content,
            }),
            Err(_) => warn!("Skipping {}: not valid UTF-8 text", entry.path),
        }
    }

    if primary_document.trim().is_empty() {
        return Err(CompileError::MissingPrimaryDocument(format!(
            "{} is empty",
            primary_path
        )));
    }

    info!(
        "Found instruction file {} with {} resource file(s)",
        primary_path,
        resources.len()
    );

    Ok(SkillSourceData {
        primary_path,
        primary_document,
        resources,
    })
}
