//! Turns Markdown files with YAML front matter into table rows, uploading
//! referenced images along the way.

mod error;
mod images;
mod ingester;
mod status;

pub use error::IngestError;
pub use images::{ImageReference, ImageUploader, find_image_references};
pub use ingester::{IngestReport, Ingester};
pub use status::UploadStatus;
