use std::fmt;

use crate::llm::prompts::ARGUMENT_INVITATION;

#[derive(Debug, Clone)]
pub struct LintIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Error, // Command will not load
    Warning, // Loads, but likely not what the author meant
    Info,    // Nice to have
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

const MAX_DESCRIPTION_CHARS: usize = 200;
const KNOWN_KEYS: [&str; 2] = ["description", "prompt"];

fn issue(severity: Severity, category: &str, message: String, suggestion: Option<&str>) -> LintIssue {
    LintIssue {
        severity,
        category: category.to_string(),
        message,
        suggestion: suggestion.map(str::to_string),
    }
}

/// Advisory checks for a compiled `command.toml`.
///
/// Compilation itself never parses the model's output; this linter is how the
/// CLI tells the user whether Gemini CLI is likely to accept it.
pub struct CommandLinter;

impl Default for CommandLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandLinter {
    pub fn new() -> Self {
        Self
    }

    pub fn lint(&self, content: &str) -> Vec<LintIssue> {
        let table: toml::Table = match toml::from_str(content) {
            Ok(table) => table,
            Err(e) => {
                return vec![issue(
                    Severity::Error,
                    "toml",
                    format!("Not valid TOML: {}", e.message()),
                    Some("Check quoting of the prompt; use '''...''' if it contains \"\"\""),
                )];
            }
        };

        let mut issues = Vec::new();
        issues.extend(self.check_description(&table));
        issues.extend(self.check_prompt(&table));

        for key in table.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                issues.push(issue(
                    Severity::Warning,
                    "structure",
                    format!("Unexpected key '{}'", key),
                    Some("Gemini CLI commands only read `description` and `prompt`"),
                ));
            }
        }

        issues
    }

    fn check_description(&self, table: &toml::Table) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        match table.get("description") {
            None => issues.push(issue(
                Severity::Error,
                "description",
                "Missing `description` field".to_string(),
                None,
            )),
            Some(toml::Value::String(text)) => {
                if text.trim().is_empty() {
                    issues.push(issue(
                        Severity::Warning,
                        "description",
                        "`description` is empty".to_string(),
                        None,
                    ));
                }
                if text.contains('\n') || text.chars().count() > MAX_DESCRIPTION_CHARS {
                    issues.push(issue(
                        Severity::Warning,
                        "description",
                        format!(
                            "`description` should be one short sentence (≤{} chars, single line)",
                            MAX_DESCRIPTION_CHARS
                        ),
                        None,
                    ));
                }
            }
            Some(other) => issues.push(issue(
                Severity::Error,
                "description",
                format!("`description` must be a string, found {}", other.type_str()),
                None,
            )),
        }
        issues
    }

    fn check_prompt(&self, table: &toml::Table) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let text = match table.get("prompt") {
            None => {
                issues.push(issue(
                    Severity::Error,
                    "prompt",
                    "Missing `prompt` field".to_string(),
                    None,
                ));
                return issues;
            }
            Some(toml::Value::String(text)) => text,
            Some(other) => {
                issues.push(issue(
                    Severity::Error,
                    "prompt",
                    format!("`prompt` must be a string, found {}", other.type_str()),
                    None,
                ));
                return issues;
            }
        };

        if text.trim().is_empty() {
            issues.push(issue(
                Severity::Error,
                "prompt",
                "`prompt` is empty".to_string(),
                None,
            ));
            return issues;
        }

        if text.contains("--- BEGIN FILE:") {
            issues.push(issue(
                Severity::Info,
                "prompt",
                "`prompt` still contains archive file delimiters".to_string(),
                Some("The model copied the context blob instead of rewriting it"),
            ));
        }

        if !text.contains("{{args}}") && !text.trim_end().ends_with(ARGUMENT_INVITATION) {
            issues.push(issue(
                Severity::Info,
                "arguments",
                "`prompt` does not end with an invitation for the user's request".to_string(),
                Some("Gemini CLI appends the arguments after the prompt; end it with a lead-in sentence or use {{args}}"),
            ));
        }

        issues
    }

    pub fn print_issues(&self, issues: &[LintIssue]) {
        if issues.is_empty() {
            println!("No lint issues found.");
            return;
        }

        println!("\ncommand.toml lint results:\n");

        for severity in [Severity::Error, Severity::Warning, Severity::Info] {
            let group: Vec<_> = issues.iter().filter(|i| i.severity == severity).collect();
            if group.is_empty() {
                continue;
            }
            println!("{} ({}):", severity, group.len());
            for issue in group {
                println!("   • [{}] {}", issue.category, issue.message);
                if let Some(suggestion) = &issue.suggestion {
                    println!("     → {}", suggestion);
                }
            }
            println!();
        }
    }
}

pub fn error_count(issues: &[LintIssue]) -> usize {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint(content: &str) -> Vec<LintIssue> {
        CommandLinter::new().lint(content)
    }

    fn has(issues: &[LintIssue], severity: Severity, category: &str) -> bool {
        issues
            .iter()
            .any(|i| i.severity == severity && i.category == category)
    }

    #[test]
    fn test_clean_command() {
        let issues = lint(
            "description = \"Draws a spiral\"\nprompt = \"\"\"\nI draw spirals.\n\nNow, carry out the task according to the user's request below:\n\"\"\"\n",
        );
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_args_placeholder_accepted() {
        let issues = lint("description = \"d\"\nprompt = \"Do {{args}}\"\n");
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_invalid_toml() {
        let issues = lint("description = \"unterminated\nprompt = 1");
        assert_eq!(issues.len(), 1);
        assert!(has(&issues, Severity::Error, "toml"));
    }

    #[test]
    fn test_missing_fields() {
        let issues = lint("title = \"x\"\n");
        assert!(has(&issues, Severity::Error, "description"));
        assert!(has(&issues, Severity::Error, "prompt"));
        assert!(has(&issues, Severity::Warning, "structure"));
        assert_eq!(error_count(&issues), 2);
    }

    #[test]
    fn test_wrong_types() {
        let issues = lint("description = 3\nprompt = [\"a\"]\n");
        assert_eq!(error_count(&issues), 2);
    }

    #[test]
    fn test_long_description_warns() {
        let long = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        let issues = lint(&format!("description = \"{}\"\nprompt = \"{{{{args}}}}\"\n", long));
        assert!(has(&issues, Severity::Warning, "description"));
        assert_eq!(error_count(&issues), 0);
    }

    #[test]
    fn test_leftover_delimiters_and_missing_invitation() {
        let issues = lint(
            "description = \"d\"\nprompt = \"\"\"\n--- BEGIN FILE: code.js ---\nx\n\"\"\"\n",
        );
        assert!(has(&issues, Severity::Info, "prompt"));
        assert!(has(&issues, Severity::Info, "arguments"));
        assert_eq!(error_count(&issues), 0);
    }

    #[test]
    fn test_empty_prompt_is_error() {
        let issues = lint("description = \"d\"\nprompt = \"  \"\n");
        assert!(has(&issues, Severity::Error, "prompt"));
    }
}
