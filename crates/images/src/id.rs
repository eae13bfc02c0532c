use sha2::{Digest, Sha256};

/// Content-addressed identifier for an image at `relative_path`.
///
/// The path is normalised to `/` separators and lowercased before hashing,
/// so the same file always maps to the same 16 hex character identifier
/// regardless of platform or casing.
pub fn image_id(relative_path: &str) -> String {
    let normalised = relative_path
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_lowercase();
    let digest = Sha256::digest(normalised.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(16);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_lowercase_hex() {
        let id = image_id("images/screenshot.png");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn case_and_separator_insensitive() {
        assert_eq!(
            image_id("Images\\Screenshot.PNG"),
            image_id("images/screenshot.png")
        );
        assert_eq!(image_id("./a/b.png"), image_id("a/b.png"));
    }

    #[test]
    fn different_paths_differ() {
        assert_ne!(image_id("a/one.png"), image_id("a/two.png"));
    }
}
