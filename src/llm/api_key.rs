use std::fmt;

/// Credential for a model provider, read from the environment at client
/// construction. Formatting never reveals the value.
#[derive(Clone, Default)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Empty or the literal "none" (local endpoints that take no key).
    pub fn is_absent(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            write!(f, "ApiKey(<absent>)")
        } else {
            write!(f, "ApiKey(***)")
        }
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
