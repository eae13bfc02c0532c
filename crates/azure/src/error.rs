use jawn_blob::BlobError;
use jawn_state::StateError;
use thiserror::Error;

/// Errors from the Azure backends.
#[derive(Debug, Error)]
pub enum AzureError {
    /// The Azure service returned an error.
    #[error("Azure service error: {0}")]
    Service(String),

    /// The request was throttled by the Azure service.
    #[error("Azure request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with Azure.
    #[error("Azure connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("Azure request timed out")]
    Timeout,

    /// Azure credential resolution failed.
    #[error("credential error: {0}")]
    Credential(String),

    /// Configuration is invalid (e.g. a malformed connection string).
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Map an SDK or HTTP error string onto an [`AzureError`] variant.
pub fn classify_azure_error(error_str: &str) -> AzureError {
    let lower = error_str.to_lowercase();
    if lower.contains("429")
        || lower.contains("throttl")
        || lower.contains("rate exceed")
        || lower.contains("too many")
        || lower.contains("server busy")
    {
        AzureError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AzureError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        AzureError::Connection(error_str.to_owned())
    } else {
        AzureError::Service(error_str.to_owned())
    }
}

/// `true` when an SDK error string describes a missing blob or resource.
#[cfg_attr(not(feature = "blob"), allow(dead_code))]
pub(crate) fn is_not_found(error_str: &str) -> bool {
    let lower = error_str.to_lowercase();
    lower.contains("404") || lower.contains("notfound") || lower.contains("not found")
}

impl From<AzureError> for StateError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::Connection(msg) => StateError::Connection(msg),
            AzureError::Timeout => StateError::Timeout(std::time::Duration::from_secs(30)),
            AzureError::Credential(msg) | AzureError::Configuration(msg) => {
                StateError::Connection(msg)
            }
            other => StateError::Backend(other.to_string()),
        }
    }
}

impl From<AzureError> for BlobError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::Connection(msg) | AzureError::Credential(msg) => {
                BlobError::Connection(msg)
            }
            other => BlobError::Storage(other.to_string()),
        }
    }
}
