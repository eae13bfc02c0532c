mod cache;
mod images;
mod refresh;
mod server;
mod storage;


pub use cache::*;
pub use images::*;
pub use refresh::*;
pub use server::*;
pub use storage::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the site, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct JawnConfig {
    /// HTTP bind and hosting configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Table store backend.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Distributed cache backend and cache lifetimes.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Image blob storage.
    #[serde(default)]
    pub images: ImagesConfig,
    /// Cache refresh endpoint protection.
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl JawnConfig {
    /// Read `path`, or fall back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Self::from_toml("");
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] on malformed TOML.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }
}
