use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode {size} variant: {reason}")]
    Encode { size: String, reason: String },
}
