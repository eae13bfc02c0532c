use jawn_core::ImageSize;

/// Builds public URLs for stored images.
///
/// With a CDN endpoint the URL points straight at the CDN
/// (`{cdn}/{container}/{id}/{size}`). Without one it goes through the
/// site's own `/article-images` proxy.
#[derive(Debug, Clone)]
pub struct ImageUrls {
    cdn_endpoint: Option<String>,
    container: String,
}

impl ImageUrls {
    pub fn new(cdn_endpoint: Option<String>, container: impl Into<String>) -> Self {
        Self {
            cdn_endpoint: cdn_endpoint
                .map(|c| c.trim_end_matches('/').to_owned())
                .filter(|c| !c.is_empty()),
            container: container.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Blob name for a variant: `{id}/{size}`.
    pub fn blob_path(id: &str, size: ImageSize) -> String {
        format!("{id}/{size}")
    }

    pub fn url(&self, id: &str, size: ImageSize) -> String {
        match &self.cdn_endpoint {
            Some(cdn) => format!("{cdn}/{}/{id}/{size}", self.container),
            None => format!("/article-images/{id}/{size}"),
        }
    }
}
