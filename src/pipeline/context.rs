use std::fmt;

use super::collector::SkillSourceData;

fn begin_marker(path: &str) -> String {
    format!("--- BEGIN FILE: {} ---", path)
}

fn end_marker(path: &str) -> String {
    format!("--- END FILE: {} ---", path)
}

/// The whole skill rendered as one prompt-ready string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlob(String);

impl ContextBlob {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text strictly between the begin/end delimiter lines for `path`.
    pub fn resource(&self, path: &str) -> Option<&str> {
        let begin = format!("{}\n", begin_marker(path));
        let end = format!("\n{}", end_marker(path));

        let start = self.0.find(&begin)? + begin.len();
        let len = self.0[start..].find(&end)?;
        Some(&self.0[start..start + len])
    }
}

impl fmt::Display for ContextBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render the primary document followed by each resource between delimiter lines.
///
/// Content is copied verbatim, resources keep their extraction order.
pub fn serialize_context(data: &SkillSourceData) -> ContextBlob {
    let capacity = data.primary_document.len()
        + data
            .resources
            .iter()
            .map(|r| r.content.len() + 2 * r.path.len() + 48)
            .sum::<usize>();
    let mut blob = String::with_capacity(capacity);

    blob.push_str(&data.primary_document);

    for resource in &data.resources {
        blob.push_str("\n\n");
        blob.push_str(&begin_marker(&resource.path));
        blob.push('\n');
        blob.push_str(&resource.content);
        blob.push('\n');
        blob.push_str(&end_marker(&resource.path));
    }

    ContextBlob(blob)
}
