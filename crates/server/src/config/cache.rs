use std::time::Duration;

use jawn_content::{CacheSettings, DEFAULT_OUTPUT_CACHE_BYTES};
use serde::Deserialize;

/// Configuration for the distributed cache tier and cache lifetimes.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Which backend to use: `"memory"` or `"redis"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Connection URL for the backend (e.g. `redis://localhost:6379`).
    pub url: Option<String>,

    /// Key prefix shared by every cache entry.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Lifetime of the in-process tier.
    #[serde(default = "default_local_ttl")]
    pub local_ttl_seconds: u64,

    /// Lifetime of the distributed tier.
    #[serde(default = "default_distributed_ttl")]
    pub distributed_ttl_seconds: u64,

    /// Byte budget for buffered page and image responses.
    #[serde(default = "default_output_max_bytes")]
    pub output_max_bytes: u64,
}

impl CacheConfig {
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            local_ttl: Duration::from_secs(self.local_ttl_seconds),
            distributed_ttl: Duration::from_secs(self.distributed_ttl_seconds),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            prefix: default_prefix(),
            local_ttl_seconds: default_local_ttl(),
            distributed_ttl_seconds: default_distributed_ttl(),
            output_max_bytes: default_output_max_bytes(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_prefix() -> String {
    "CopilotThatJawn".to_owned()
}

fn default_local_ttl() -> u64 {
    300
}

fn default_distributed_ttl() -> u64 {
    21_600
}

fn default_output_max_bytes() -> u64 {
    DEFAULT_OUTPUT_CACHE_BYTES
}
