pub mod error;
pub mod memory;
pub mod store;

pub use error::BlobError;
pub use memory::MemoryBlobStore;
pub use store::{BlobStore, StoredBlob};

/// Container holding article images and their resized variants.
pub const CONTENT_IMAGES_CONTAINER: &str = "content-images";
