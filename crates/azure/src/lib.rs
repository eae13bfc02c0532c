//! Azure backends for the content site.
//!
//! - [`AzureContentTable`] talks to Azure Table Storage (or Azurite) over the
//!   REST API, signing requests with the account key from a storage
//!   connection string.
//! - `AzureBlobStore` (`blob` feature) stores images in Azure Blob Storage
//!   using an Entra ID credential.

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod table;

#[cfg(feature = "blob")]
pub mod blob;

pub use config::AzureBaseConfig;
pub use connection::StorageConnection;
pub use error::{AzureError, classify_azure_error};
pub use table::AzureContentTable;

#[cfg(feature = "blob")]
pub use blob::AzureBlobStore;
