use std::path::PathBuf;

use jawn_blob::BlobError;
use jawn_core::FrontMatterError;
use jawn_images::ImageError;
use jawn_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),

    #[error("table store error: {0}")]
    State(#[from] StateError),

    #[error("image upload failed: {0}")]
    Blob(#[from] BlobError),

    #[error("image processing failed: {0}")]
    Image(#[from] ImageError),

    #[error("{0} is not a markdown file or directory")]
    NotMarkdown(PathBuf),
}
