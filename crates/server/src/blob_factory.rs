use std::sync::Arc;

use jawn_blob::{BlobStore, MemoryBlobStore};
use tracing::info;

use crate::config::{ImagesConfig, StorageConfig};
use crate::error::ServerError;

/// Create the image blob store from the given configuration.
///
/// The `azure` backend reads its blob endpoint from the storage connection
/// string and authenticates with the configured service principal, or the
/// Azure CLI login when none is set.
#[allow(clippy::unused_async)]
#[cfg_attr(not(feature = "azure"), allow(unused_variables))]
pub async fn create_blob_store(
    images: &ImagesConfig,
    storage: &StorageConfig,
) -> Result<Arc<dyn BlobStore>, ServerError> {
    let store: Arc<dyn BlobStore> = match images.backend.as_str() {
        "memory" => Arc::new(MemoryBlobStore::new()),
        #[cfg(feature = "azure")]
        "azure" => {
            let connection_string = storage.connection_string.as_deref().ok_or_else(|| {
                ServerError::Config(
                    "azure image backend requires [storage] connection_string".into(),
                )
            })?;
            let connection = jawn_azure::StorageConnection::parse(connection_string)
                .map_err(|e| ServerError::Config(format!("storage connection string: {e}")))?;

            let mut azure = jawn_azure::AzureBaseConfig::default();
            azure.tenant_id.clone_from(&images.tenant_id);
            azure.client_id.clone_from(&images.client_id);
            azure.client_credential.clone_from(&images.client_credential);

            let store = jawn_azure::AzureBlobStore::new(&connection.blob_endpoint, &azure)
                .await
                .map_err(|e| ServerError::Config(format!("azure blob: {e}")))?;
            Arc::new(store)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported image backend: {other}"
            )));
        }
    };
    info!(backend = %images.backend, container = %images.container, "image store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_is_default() {
        let store = create_blob_store(&ImagesConfig::default(), &StorageConfig::default())
            .await
            .unwrap();
        assert!(store.get("content-images", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_backend_is_config_error() {
        let images = ImagesConfig {
            backend: "s3".into(),
            ..ImagesConfig::default()
        };
        assert!(matches!(
            create_blob_store(&images, &StorageConfig::default()).await,
            Err(ServerError::Config(_))
        ));
    }
}
