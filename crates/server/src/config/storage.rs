use std::fmt;
use std::path::PathBuf;

use jawn_state::CONTENT_TABLE;
use serde::Deserialize;

/// Configuration for the article table store.
#[derive(Deserialize)]
pub struct StorageConfig {
    /// Which backend to use: `"memory"` or `"azure"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Azure Storage connection string. Required by the `azure` backend and
    /// by the `azure` image backend, which takes its blob endpoint from it.
    pub connection_string: Option<String>,

    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Directory ingested into the `memory` backend at startup.
    pub seed_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            connection_string: None,
            table_name: default_table_name(),
            seed_dir: None,
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("table_name", &self.table_name)
            .field("seed_dir", &self.seed_dir)
            .finish()
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_table_name() -> String {
    CONTENT_TABLE.to_owned()
}
