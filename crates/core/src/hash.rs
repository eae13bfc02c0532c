use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::article::Article;

/// Change-detection digest over an article's semantic fields.
///
/// Dates, slug, filename, images and rendered HTML are not part of the digest.
pub fn content_hash(article: &Article) -> String {
    let input = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        article.title,
        article.category,
        article.tags.join(","),
        article.difficulty,
        article.author,
        article.description,
        article.content,
    );
    STANDARD.encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::tests::article;

    #[test]
    fn stable_across_calls() {
        let a = article("a", "Tips", &["x", "y"]);
        assert_eq!(content_hash(&a), content_hash(&a.clone()));
    }

    #[test]
    fn ignores_dates_and_slug() {
        let a = article("a", "Tips", &["x"]);
        let mut b = a.clone();
        b.url_slug = "other".into();
        b.published_date = chrono::Utc::now();
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn changes_with_content_and_tag_order() {
        let a = article("a", "Tips", &["x", "y"]);
        let mut b = a.clone();
        b.content = "edited".into();
        assert_ne!(content_hash(&a), content_hash(&b));

        let c = article("a", "Tips", &["y", "x"]);
        assert_ne!(content_hash(&a), content_hash(&c));
    }
}
