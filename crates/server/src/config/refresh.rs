use std::fmt;

use serde::Deserialize;

/// Shared secret for the cache refresh endpoints.
#[derive(Default, Deserialize)]
pub struct RefreshConfig {
    /// Value the `X-API-Key` header must carry.
    pub api_key: Option<String>,
}

impl RefreshConfig {
    /// The configured key, ignoring blank values.
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for RefreshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
