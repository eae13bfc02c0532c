use std::path::Path;

use image::ImageFormat;

/// MIME type for a file name or extension. Unknown extensions map to
/// `application/octet-stream`.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(path)
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// `true` when `path` has one of the recognised image extensions.
pub fn is_supported_image(path: &str) -> bool {
    content_type_for(path) != "application/octet-stream"
}

/// Guess the MIME type from the leading bytes.
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start();
    if trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && text.contains("<svg")) {
        return Some("image/svg+xml");
    }
    if bytes.len() > 12 && &bytes[4..8] == b"ftyp" && &bytes[8..12] == b"avif" {
        return Some("image/avif");
    }
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("dir/a.png"), "image/png");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.svg"), "image/svg+xml");
        assert_eq!(content_type_for("a.avif"), "image/avif");
        assert_eq!(content_type_for("a.bmp"), "application/octet-stream");
        assert_eq!(content_type_for("png"), "image/png");
    }

    #[test]
    fn supported() {
        assert!(is_supported_image("x.webp"));
        assert!(!is_supported_image("x.txt"));
    }

    #[test]
    fn sniffs_magic_bytes() {
        assert_eq!(
            sniff_content_type(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some("image/png")
        );
        assert_eq!(sniff_content_type(b"\xff\xd8\xff\xe0\0\x10JFIF"), Some("image/jpeg"));
        assert_eq!(sniff_content_type(b"GIF89a...."), Some("image/gif"));
        assert_eq!(
            sniff_content_type(br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#),
            Some("image/svg+xml")
        );
        assert_eq!(sniff_content_type(b"hello"), None);
    }
}
