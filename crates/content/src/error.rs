use jawn_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    /// The table store could not be read.
    #[error("content store unavailable: {0}")]
    Store(#[from] StateError),

    #[error("failed to encode cached content: {0}")]
    Serialization(String),
}
