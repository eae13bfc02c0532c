use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The blob name is empty or otherwise unusable.
    #[error("invalid blob name: {0}")]
    InvalidName(String),

    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),

    /// Could not reach the storage service.
    #[error("blob connection error: {0}")]
    Connection(String),
}
