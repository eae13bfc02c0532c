use jawn_core::{ImageInfo, ImageSize};

const IMAGE_ID_LEN: usize = 16;

/// The site-relative path an uploaded image is referenced by in article
/// bodies, e.g. `/images/3f2a9c0d1b7e4a55/medium`.
pub fn canonical_image_path(image_id: &str, size: ImageSize) -> String {
    format!("/images/{image_id}/{size}")
}

/// `true` for URLs with a scheme (`https:`, `data:`) or protocol-relative
/// `//host/...` references.
pub fn is_absolute_url(src: &str) -> bool {
    if src.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = src.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Generated image identifiers are 16 lowercase hex characters.
pub fn looks_like_image_id(candidate: &str) -> bool {
    candidate.len() == IMAGE_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Maps image references found in Markdown to servable URLs.
///
/// Resolution order for a relative reference:
/// 1. `images/{id}[/{size}]` where `{id}` is a known or well-formed identifier
/// 2. `images/{file}` or a bare `{file}`, looked up by filename among the
///    article's uploaded images
///
/// Absolute URLs and anything unresolvable yield `None` and are left as
/// written.
pub struct ImageResolver<'a> {
    images: &'a [ImageInfo],
    url_for: Box<dyn Fn(&str, ImageSize) -> String + Send + Sync + 'a>,
}

impl std::fmt::Debug for ImageResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("images", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl<'a> ImageResolver<'a> {
    /// Resolve against `images`, producing canonical `/images/...` paths.
    pub fn new(images: &'a [ImageInfo]) -> Self {
        Self {
            images,
            url_for: Box::new(canonical_image_path),
        }
    }

    /// A resolver that knows no images; only well-formed identifier paths
    /// are rewritten.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Replace the URL builder, e.g. to point at a CDN.
    #[must_use]
    pub fn with_url_builder(
        mut self,
        url_for: impl Fn(&str, ImageSize) -> String + Send + Sync + 'a,
    ) -> Self {
        self.url_for = Box::new(url_for);
        self
    }

    pub fn resolve(&self, src: &str) -> Option<String> {
        let src = src.trim();
        if src.is_empty() || is_absolute_url(src) {
            return None;
        }

        let path = src.split(['?', '#']).next().unwrap_or(src);
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty() && *p != ".").collect();

        let file_name = match parts.as_slice() {
            [head, candidate, rest @ ..] if head.eq_ignore_ascii_case("images") => {
                let candidate = *candidate;
                if self.is_known_id(candidate) || looks_like_image_id(candidate) {
                    let size = rest
                        .first()
                        .and_then(|s| s.parse::<ImageSize>().ok())
                        .unwrap_or(ImageSize::Original);
                    return Some((self.url_for)(candidate, size));
                }
                parts.last().copied()
            }
            [single] => Some(*single),
            _ => parts.last().copied(),
        }?;

        self.images
            .iter()
            .find(|img| img.file_name.eq_ignore_ascii_case(file_name))
            .map(|img| (self.url_for)(&img.image_id, ImageSize::Original))
    }

    fn is_known_id(&self, candidate: &str) -> bool {
        self.images.iter().any(|img| img.image_id == candidate)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn info(id: &str, file_name: &str) -> ImageInfo {
        ImageInfo {
            file_name: file_name.to_owned(),
            image_id: id.to_owned(),
            blob_path: format!("{id}/original"),
            public_url: String::new(),
            alt_text: String::new(),
            caption: None,
            width: 10,
            height: 10,
            size_in_bytes: 100,
            content_type: "image/png".to_owned(),
            uploaded_at: Utc::now(),
            content_hash: String::new(),
            original_path: format!("images/{file_name}"),
        }
    }

    #[test]
    fn absolute_urls_are_untouched() {
        let resolver = ImageResolver::empty();
        assert_eq!(resolver.resolve("https://example.com/a.png"), None);
        assert_eq!(resolver.resolve("//cdn.example.com/a.png"), None);
        assert_eq!(resolver.resolve("data:image/png;base64,AAAA"), None);
        assert!(!is_absolute_url("images/a.png"));
        assert!(!is_absolute_url("c:foo"));
    }

    #[test]
    fn identifier_paths_keep_their_size() {
        let resolver = ImageResolver::empty();
        assert_eq!(
            resolver.resolve("/images/0123456789abcdef/large").as_deref(),
            Some("/images/0123456789abcdef/large")
        );
        assert_eq!(
            resolver.resolve("images/0123456789abcdef").as_deref(),
            Some("/images/0123456789abcdef/original")
        );
    }

    #[test]
    fn filenames_resolve_through_article_images() {
        let images = vec![info("aaaaaaaaaaaaaaaa", "Chat.png")];
        let resolver = ImageResolver::new(&images);
        assert_eq!(
            resolver.resolve("images/chat.png").as_deref(),
            Some("/images/aaaaaaaaaaaaaaaa/original")
        );
        assert_eq!(
            resolver.resolve("Chat.png").as_deref(),
            Some("/images/aaaaaaaaaaaaaaaa/original")
        );
        assert_eq!(resolver.resolve("images/unknown.png"), None);
    }

    #[test]
    fn custom_url_builder() {
        let images = vec![info("bbbbbbbbbbbbbbbb", "a.png")];
        let resolver = ImageResolver::new(&images)
            .with_url_builder(|id, size| format!("https://cdn.test/content-images/{id}/{size}"));
        assert_eq!(
            resolver.resolve("a.png").as_deref(),
            Some("https://cdn.test/content-images/bbbbbbbbbbbbbbbb/original")
        );
    }

    #[test]
    fn id_shape() {
        assert!(looks_like_image_id("0123456789abcdef"));
        assert!(!looks_like_image_id("0123456789ABCDEF"));
        assert!(!looks_like_image_id("chat.png"));
    }
}
