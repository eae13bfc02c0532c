use std::fmt;

use jawn_blob::CONTENT_IMAGES_CONTAINER;
use serde::Deserialize;

/// Configuration for article image storage.
#[derive(Deserialize)]
pub struct ImagesConfig {
    /// Which backend to use: `"memory"` or `"azure"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_container")]
    pub container: String,

    /// CDN origin for image URLs. Without one, images go through the
    /// `/article-images` proxy.
    pub cdn_endpoint: Option<String>,

    /// Entra ID tenant of the service principal. When the three
    /// service-principal fields are absent the Azure CLI login is used.
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_credential: Option<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            container: default_container(),
            cdn_endpoint: None,
            tenant_id: None,
            client_id: None,
            client_credential: None,
        }
    }
}

impl fmt::Debug for ImagesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagesConfig")
            .field("backend", &self.backend)
            .field("container", &self.container)
            .field("cdn_endpoint", &self.cdn_endpoint)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_credential",
                &self.client_credential.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_container() -> String {
    CONTENT_IMAGES_CONTAINER.to_owned()
}
