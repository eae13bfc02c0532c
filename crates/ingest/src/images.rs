use std::collections::HashMap;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use jawn_blob::BlobStore;
use jawn_core::{ImageInfo, ImageSize};
use jawn_images::{ImageUrls, content_type_for, image_id, process};
use jawn_markdown::{canonical_image_path, is_absolute_url};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::IngestError;

static IMAGE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]]*)\]\(\s*<?([^)\s>]+)>?(?:\s+"([^"]*)")?\s*\)"#)
        .expect("image reference regex is valid")
});

/// A Markdown image reference `![alt](path "title")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub alt: String,
    pub path: String,
    pub title: Option<String>,
    /// Byte range of `path` within the scanned text.
    pub span: Range<usize>,
}

/// Every image reference in `markdown`, in document order.
pub fn find_image_references(markdown: &str) -> Vec<ImageReference> {
    IMAGE_REF_RE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let path = caps.get(2)?;
            Some(ImageReference {
                alt: caps.get(1).map_or("", |m| m.as_str()).trim().to_owned(),
                path: path.as_str().to_owned(),
                title: caps
                    .get(3)
                    .map(|m| m.as_str().trim().to_owned())
                    .filter(|t| !t.is_empty()),
                span: path.range(),
            })
        })
        .collect()
}

/// Uploads images referenced by an article and rewrites the references to
/// their canonical `/images/{id}/original` paths.
#[derive(Clone)]
pub struct ImageUploader {
    store: Arc<dyn BlobStore>,
    urls: ImageUrls,
}

impl std::fmt::Debug for ImageUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUploader")
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl ImageUploader {
    pub fn new(store: Arc<dyn BlobStore>, urls: ImageUrls) -> Self {
        Self { store, urls }
    }

    /// Upload every local image `body` references and return the rewritten
    /// body plus one [`ImageInfo`] per distinct image.
    ///
    /// Paths resolve against the directory of `markdown_file`. Identifiers
    /// derive from the article's file name joined with the image path as
    /// written relative to the article, so they do not depend on where an
    /// ingestion run starts. Absolute URLs and missing files are left alone.
    ///
    /// # Errors
    ///
    /// Fails when an image cannot be read, decoded or stored.
    pub async fn upload_referenced(
        &self,
        body: &str,
        markdown_file: &Path,
        now: DateTime<Utc>,
    ) -> Result<(String, Vec<ImageInfo>), IngestError> {
        let markdown_dir = markdown_file.parent().unwrap_or_else(|| Path::new("."));
        let article = markdown_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let references = find_image_references(body);
        let mut rewritten = String::with_capacity(body.len());
        let mut images: Vec<ImageInfo> = Vec::new();
        let mut uploaded: HashMap<PathBuf, String> = HashMap::new();
        let mut cursor = 0;

        for reference in references {
            if is_absolute_url(&reference.path) || reference.path.starts_with('/') {
                continue;
            }
            let file = normalize(&markdown_dir.join(&reference.path));
            if !file.is_file() {
                debug!(path = %reference.path, "image reference has no local file, leaving as is");
                continue;
            }

            let id = match uploaded.get(&file) {
                Some(id) => id.clone(),
                None => {
                    let info = self.upload_file(&file, article, &reference, now).await?;
                    let id = info.image_id.clone();
                    uploaded.insert(file, id.clone());
                    images.push(info);
                    id
                }
            };

            rewritten.push_str(&body[cursor..reference.span.start]);
            rewritten.push_str(&canonical_image_path(&id, ImageSize::Original));
            cursor = reference.span.end;
        }
        rewritten.push_str(&body[cursor..]);
        Ok((rewritten, images))
    }

    async fn upload_file(
        &self,
        file: &Path,
        article: &str,
        reference: &ImageReference,
        now: DateTime<Utc>,
    ) -> Result<ImageInfo, IngestError> {
        let data = tokio::fs::read(file).await.map_err(|source| IngestError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let relative = article_relative(&reference.path);
        let id = image_id(&format!("{article}/{relative}"));
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&relative)
            .to_owned();
        let content_type = content_type_for(&file_name);
        let hash = base64::engine::general_purpose::STANDARD.encode(Sha256::digest(&data));
        let size_in_bytes = data.len() as u64;

        let processed = process(Bytes::from(data))?;
        for variant in &processed.variants {
            self.store
                .put(
                    self.urls.container(),
                    &ImageUrls::blob_path(&id, variant.size),
                    content_type,
                    variant.data.clone(),
                )
                .await?;
        }
        info!(file = %relative, image_id = %id, variants = processed.variants.len(), "image uploaded");

        let alt_text = if reference.alt.is_empty() {
            file.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_owned()
        } else {
            reference.alt.clone()
        };

        Ok(ImageInfo {
            file_name,
            blob_path: ImageUrls::blob_path(&id, ImageSize::Original),
            public_url: self.urls.url(&id, ImageSize::Original),
            alt_text,
            caption: reference.title.clone(),
            width: processed.width,
            height: processed.height,
            size_in_bytes,
            content_type: content_type.to_owned(),
            uploaded_at: now,
            content_hash: hash,
            original_path: relative,
            image_id: id,
        })
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// `/`-separated form of an image reference with `.` collapsed and `..`
/// resolved where possible. Leading `..` segments are kept.
fn article_relative(reference: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in reference.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." if parts.last().is_some_and(|p| *p != "..") => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
