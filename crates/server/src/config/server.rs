use std::fmt;

use serde::Deserialize;

/// Hosting environment. Development disables the output cache and lets
/// refresh requests through when no API key is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    /// Canonical site URL used in the sitemap and feed (e.g.
    /// `https://copilotthatjawn.com`).
    ///
    /// If not set, it is derived from each request's `Host` header.
    pub public_url: Option<String>,
    /// Directory of static assets served for unmatched paths.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Maximum time to wait for in-flight requests during shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            public_url: None,
            static_dir: default_static_dir(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "wwwroot".to_owned()
}

fn default_shutdown_timeout() -> u64 {
    30
}
