use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the renditions stored for every uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Original,
    Thumbnail,
    Medium,
    Large,
}

impl ImageSize {
    /// Every size, original first.
    pub const ALL: [Self; 4] = [Self::Original, Self::Thumbnail, Self::Medium, Self::Large];

    /// The resized variants (everything except the original).
    pub const VARIANTS: [Self; 3] = [Self::Thumbnail, Self::Medium, Self::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Thumbnail => "thumbnail",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Bounding box for the variant, or `None` for the original.
    pub fn bounds(self) -> Option<(u32, u32)> {
        match self {
            Self::Original => None,
            Self::Thumbnail => Some((150, 150)),
            Self::Medium => Some((400, 400)),
            Self::Large => Some((800, 800)),
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "thumbnail" => Ok(Self::Thumbnail),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown image size: {other}")),
        }
    }
}

/// Metadata recorded for an image uploaded alongside an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    /// Source filename, e.g. `copilot-chat.png`.
    pub file_name: String,
    /// Content-addressed identifier shared by all renditions.
    pub image_id: String,
    /// Blob path of the original rendition.
    pub blob_path: String,
    pub public_url: String,
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub width: u32,
    pub height: u32,
    pub size_in_bytes: u64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    /// Base64 SHA-256 of the original bytes.
    pub content_hash: String,
    /// Path of the source file relative to the referencing article.
    pub original_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_case_insensitively() {
        assert_eq!("Large".parse::<ImageSize>(), Ok(ImageSize::Large));
        assert!("huge".parse::<ImageSize>().is_err());
    }

    #[test]
    fn only_variants_have_bounds() {
        assert!(ImageSize::Original.bounds().is_none());
        for size in ImageSize::VARIANTS {
            assert!(size.bounds().is_some());
        }
        assert_eq!(ImageSize::Medium.bounds(), Some((400, 400)));
    }
}
