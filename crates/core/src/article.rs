use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image::ImageInfo;

const WORDS_PER_MINUTE: usize = 200;

/// A published tip.
///
/// `content` holds the Markdown body as ingested. `html` is filled in when
/// the article is materialized for the site and is empty straight out of the
/// parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub author: String,
    pub published_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub file_name: String,
    pub url_slug: String,
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    #[serde(default)]
    pub content_hash: String,
}

impl Article {
    /// Estimated reading time, never less than one minute.
    ///
    /// Words are space-separated runs of the rendered HTML once it exists,
    /// so markup counts towards the total. Before rendering the Markdown
    /// body is used.
    pub fn reading_time_minutes(&self) -> usize {
        let text = if self.html.is_empty() {
            &self.content
        } else {
            &self.html
        };
        let words = text.split(' ').count();
        (words / WORDS_PER_MINUTE).max(1)
    }

    /// Table partition: the lowercased category.
    pub fn partition_key(&self) -> String {
        self.category.to_lowercase()
    }

    /// Table row: the slug when set, otherwise the source filename.
    pub fn row_key(&self) -> &str {
        if self.url_slug.is_empty() {
            &self.file_name
        } else {
            &self.url_slug
        }
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
