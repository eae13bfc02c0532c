//! Image pipeline: content-addressed identifiers, MIME detection, resized
//! variants and public URL construction.

mod error;
mod id;
mod mime;
mod resize;
mod urls;

pub use error::ImageError;
pub use id::image_id;
pub use mime::{content_type_for, is_supported_image, sniff_content_type};
pub use resize::{ProcessedImage, Variant, process};
pub use urls::ImageUrls;
