use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jawn_core::{Article, ImageInfo};

use crate::error::StateError;

/// Table-store row for one article.
///
/// Property names are PascalCase to match the table schema. Tags are stored
/// comma-joined and images as a JSON array string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContentEntity {
    pub partition_key: String,
    pub row_key: String,
    /// Last write time, assigned by the store.
    #[serde(skip_serializing)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Opaque version tag, assigned by the store when it supports one.
    #[serde(skip)]
    pub etag: Option<String>,
    pub title: String,
    pub category: String,
    pub tags: String,
    pub difficulty: String,
    pub author: String,
    pub published_date: DateTime<Utc>,
    pub description: String,
    pub content: String,
    pub file_name: String,
    pub slug: String,
    pub content_hash: String,
    pub images: String,
}

impl ContentEntity {
    /// Build the row for `article`. The caller is expected to have filled in
    /// `article.content_hash`.
    pub fn from_article(article: &Article) -> Result<Self, StateError> {
        let images = if article.images.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&article.images)?
        };
        Ok(Self {
            partition_key: article.partition_key(),
            row_key: article.row_key().to_owned(),
            timestamp: None,
            etag: None,
            title: article.title.clone(),
            category: article.category.clone(),
            tags: article.tags.join(","),
            difficulty: article.difficulty.clone(),
            author: article.author.clone(),
            published_date: article.published_date,
            description: article.description.clone(),
            content: article.content.clone(),
            file_name: article.file_name.clone(),
            slug: article.url_slug.clone(),
            content_hash: article.content_hash.clone(),
            images,
        })
    }

    /// Convert back into an [`Article`] with an empty `html` body.
    ///
    /// `last_modified` is the store timestamp, falling back to the published
    /// date. The slug falls back to the row key.
    pub fn into_article(self) -> Result<Article, StateError> {
        let images: Vec<ImageInfo> = if self.images.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.images)?
        };
        let tags = self
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        let url_slug = if self.slug.is_empty() {
            self.row_key
        } else {
            self.slug
        };
        Ok(Article {
            title: self.title,
            category: self.category,
            tags,
            difficulty: self.difficulty,
            author: self.author,
            published_date: self.published_date,
            last_modified: self.timestamp.unwrap_or(self.published_date),
            description: self.description,
            content: self.content,
            html: String::new(),
            file_name: self.file_name,
            url_slug,
            images,
            content_hash: self.content_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn article() -> Article {
        let date = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        Article {
            title: "Inline chat".into(),
            category: "GitHub Copilot".into(),
            tags: vec!["chat".into(), "vscode".into()],
            difficulty: "Beginner".into(),
            author: "Jawn".into(),
            published_date: date,
            last_modified: date,
            description: "d".into(),
            content: "Hello".into(),
            html: "<p>Hello</p>".into(),
            file_name: "inline-chat.md".into(),
            url_slug: "inline-chat".into(),
            images: Vec::new(),
            content_hash: "hash".into(),
        }
    }

    #[test]
    fn keys_and_flattened_fields() {
        let entity = ContentEntity::from_article(&article()).unwrap();
        assert_eq!(entity.partition_key, "github copilot");
        assert_eq!(entity.row_key, "inline-chat");
        assert_eq!(entity.tags, "chat,vscode");
        assert!(entity.images.is_empty());
    }

    #[test]
    fn read_back_uses_store_timestamp_and_row_key_fallback() {
        let mut entity = ContentEntity::from_article(&article()).unwrap();
        let stamp = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        entity.timestamp = Some(stamp);
        entity.slug.clear();
        entity.tags = " chat, ,vscode ".into();

        let back = entity.into_article().unwrap();
        assert_eq!(back.last_modified, stamp);
        assert_eq!(back.url_slug, "inline-chat");
        assert_eq!(back.tags, vec!["chat", "vscode"]);
        assert!(back.html.is_empty());
    }

    #[test]
    fn missing_timestamp_falls_back_to_published() {
        let entity = ContentEntity::from_article(&article()).unwrap();
        let back = entity.into_article().unwrap();
        assert_eq!(back.last_modified, back.published_date);
    }

    #[test]
    fn corrupt_images_json_is_a_serialization_error() {
        let mut entity = ContentEntity::from_article(&article()).unwrap();
        entity.images = "{not json".into();
        assert!(matches!(
            entity.into_article(),
            Err(StateError::Serialization(_))
        ));
    }

    #[test]
    fn serializes_pascal_case_without_timestamp() {
        let mut entity = ContentEntity::from_article(&article()).unwrap();
        entity.timestamp = Some(Utc::now());
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["PartitionKey"], "github copilot");
        assert_eq!(json["ContentHash"], "hash");
        assert!(json.get("Timestamp").is_none());
    }
}
