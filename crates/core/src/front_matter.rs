//! Front-matter extraction and decoding.
//!
//! A source file starts with a `---` delimited YAML block followed by the
//! Markdown body. Keys are camelCase and loosely typed: any scalar is
//! accepted as text, `tags` may be a list or a comma-separated string, and a
//! missing `publishedDate` falls back to the caller's clock.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_yaml_ng::{Mapping, Value};

use crate::article::Article;
use crate::error::FrontMatterError;
use crate::hash::content_hash;
use crate::slug::slugify;

static FRONT_MATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)")
        .expect("front matter regex is valid")
});

/// Decoded front-matter keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub difficulty: String,
    pub author: String,
    pub description: String,
    pub published_date: Option<DateTime<Utc>>,
    pub slug: Option<String>,
}

impl FrontMatter {
    /// Decode the YAML text between the delimiters.
    ///
    /// An empty block decodes to all defaults. Unknown keys are ignored.
    pub fn from_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        let value: Value =
            serde_yaml_ng::from_str(yaml).map_err(|e| FrontMatterError::Yaml(e.to_string()))?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(map) => Self::from_mapping(&map),
            _ => Err(FrontMatterError::Yaml(
                "front matter must be a key/value mapping".to_owned(),
            )),
        }
    }

    fn from_mapping(map: &Mapping) -> Result<Self, FrontMatterError> {
        let text = |key: &str| map.get(key).and_then(scalar_text).unwrap_or_default();

        let published_date = match map.get("publishedDate").and_then(scalar_text) {
            Some(raw) => Some(parse_date(&raw).ok_or(FrontMatterError::InvalidDate {
                key: "publishedDate",
                value: raw,
            })?),
            None => None,
        };

        Ok(Self {
            title: text("title"),
            category: text("category"),
            tags: map.get("tags").map(decode_tags).unwrap_or_default(),
            difficulty: text("difficulty"),
            author: text("author"),
            description: text("description"),
            published_date,
            slug: map
                .get("slug")
                .and_then(scalar_text)
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
        })
    }
}

/// Split a source file into its raw YAML block and trimmed Markdown body.
pub fn split_front_matter(source: &str) -> Result<(&str, &str), FrontMatterError> {
    let captures = FRONT_MATTER_RE
        .captures(source)
        .ok_or(FrontMatterError::Missing)?;
    let whole = captures.get(0).ok_or(FrontMatterError::Missing)?;
    let yaml = captures.get(1).map_or("", |m| m.as_str());
    Ok((yaml, source[whole.end()..].trim()))
}

/// Parse a Markdown source file into an [`Article`].
///
/// `now` stands in for a missing `publishedDate` and is also used as the
/// initial last-modified time. The slug comes from the `slug` key, falling
/// back to the slugified file stem.
pub fn parse_article(
    source: &str,
    file_name: &str,
    now: DateTime<Utc>,
) -> Result<Article, FrontMatterError> {
    let (yaml, body) = split_front_matter(source)?;
    let fm = FrontMatter::from_yaml(yaml)?;

    let url_slug = fm.slug.clone().unwrap_or_else(|| {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        slugify(stem)
    });

    let mut article = Article {
        title: fm.title,
        category: fm.category,
        tags: fm.tags,
        difficulty: fm.difficulty,
        author: fm.author,
        published_date: fm.published_date.unwrap_or(now),
        last_modified: now,
        description: fm.description,
        content: body.to_owned(),
        html: String::new(),
        file_name: file_name.to_owned(),
        url_slug,
        images: Vec::new(),
        content_hash: String::new(),
    };
    article.content_hash = content_hash(&article);
    Ok(article)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn decode_tags(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other)
            .map(|s| s.split(',').map(str::to_owned).collect())
            .unwrap_or_default(),
    };
    raw.into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    const TIP: &str = "---\ntitle: \"X\"\ncategory: \"Tips\"\ntags: [a, b]\n---\nHello\n";

    #[test]
    fn parses_example_tip() {
        let article = parse_article(TIP, "tip.md", now()).unwrap();
        assert_eq!(article.title, "X");
        assert_eq!(article.category, "Tips");
        assert_eq!(article.tags, vec!["a", "b"]);
        assert_eq!(article.content, "Hello");
        assert_eq!(article.url_slug, "tip");
        assert_eq!(article.partition_key(), "tips");
        assert_eq!(article.reading_time_minutes(), 1);
    }

    #[test]
    fn missing_front_matter_is_a_format_error() {
        let err = parse_article("# Just markdown\n", "x.md", now()).unwrap_err();
        assert!(matches!(err, FrontMatterError::Missing));
        assert_eq!(
            err.to_string(),
            "Front matter not found in the markdown file."
        );
    }

    #[test]
    fn parsing_is_idempotent() {
        let first = parse_article(TIP, "tip.md", now()).unwrap();
        let second = parse_article(TIP, "tip.md", now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.content_hash, second.content_hash);
        assert!(!first.content_hash.is_empty());
    }

    #[test]
    fn missing_date_defaults_to_clock() {
        let article = parse_article(TIP, "tip.md", now()).unwrap();
        assert_eq!(article.published_date, now());
    }

    #[test]
    fn accepts_date_only_and_rfc3339() {
        let src = "---\ntitle: A\npublishedDate: 2024-03-05\n---\nbody";
        let article = parse_article(src, "a.md", now()).unwrap();
        assert_eq!(
            article.published_date,
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );

        let src = "---\ntitle: A\npublishedDate: \"2024-03-05T10:30:00-05:00\"\n---\nbody";
        let article = parse_article(src, "a.md", now()).unwrap();
        assert_eq!(
            article.published_date,
            Utc.with_ymd_and_hms(2024, 3, 5, 15, 30, 0).unwrap()
        );
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let src = "---\ntitle: A\npublishedDate: someday\n---\nbody";
        let err = parse_article(src, "a.md", now()).unwrap_err();
        assert!(matches!(
            err,
            FrontMatterError::InvalidDate {
                key: "publishedDate",
                ..
            }
        ));
    }

    #[test]
    fn tags_accept_comma_string() {
        let fm = FrontMatter::from_yaml("tags: \"vscode, chat ,, agents\"").unwrap();
        assert_eq!(fm.tags, vec!["vscode", "chat", "agents"]);
    }

    #[test]
    fn scalars_are_stringified() {
        let fm = FrontMatter::from_yaml("title: 42\ndifficulty: true").unwrap();
        assert_eq!(fm.title, "42");
        assert_eq!(fm.difficulty, "true");
    }

    #[test]
    fn explicit_slug_wins_over_file_stem() {
        let src = "---\ntitle: A\nslug: custom-slug\n---\nbody";
        let article = parse_article(src, "Some File.md", now()).unwrap();
        assert_eq!(article.url_slug, "custom-slug");

        let src = "---\ntitle: A\n---\nbody";
        let article = parse_article(src, "Some File.md", now()).unwrap();
        assert_eq!(article.url_slug, "some-file");
    }

    #[test]
    fn handles_crlf_line_endings() {
        let src = "---\r\ntitle: A\r\ncategory: Tips\r\n---\r\nBody text\r\n";
        let article = parse_article(src, "a.md", now()).unwrap();
        assert_eq!(article.title, "A");
        assert_eq!(article.content, "Body text");
    }

    #[test]
    fn non_mapping_block_is_rejected() {
        let err = FrontMatter::from_yaml("- just\n- a list").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }
}
