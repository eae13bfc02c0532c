use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_storage_blob::BlobServiceClient;
use bytes::Bytes;
use tracing::{debug, error, instrument};

use jawn_blob::{BlobError, BlobStore, StoredBlob};

use crate::auth::build_azure_credential;
use crate::config::AzureBaseConfig;
use crate::error::{AzureError, classify_azure_error, is_not_found};

/// [`BlobStore`] backed by Azure Blob Storage.
///
/// Authenticates with an Entra ID credential (service principal or Azure CLI
/// login). Containers are expected to exist already.
pub struct AzureBlobStore {
    service_client: BlobServiceClient,
    credential: Arc<dyn TokenCredential>,
    endpoint: String,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    /// Connect to the blob endpoint `endpoint`, or to
    /// `config.endpoint_url` when set.
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::Credential`] or [`AzureError::Configuration`] if
    /// the credential or client cannot be built.
    pub async fn new(endpoint: &str, config: &AzureBaseConfig) -> Result<Self, AzureError> {
        let credential = build_azure_credential(config).await?;
        let endpoint = config
            .endpoint_url
            .clone()
            .unwrap_or_else(|| endpoint.to_owned());

        let service_client = BlobServiceClient::new(&endpoint, Some(Arc::clone(&credential)), None)
            .map_err(|e| AzureError::Configuration(format!("blob client error: {e}")))?;

        Ok(Self {
            service_client,
            credential,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(
        &self,
        container: &str,
        name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), BlobError> {
        let content_length = data.len() as u64;
        debug!(content_type, "uploading blob");

        let blob_client = self.service_client.blob_client(container, name);
        let body: azure_core::Bytes = data.to_vec().into();
        blob_client
            .upload(body.into(), true, content_length, None)
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(error = %err_str, "blob upload failed");
                BlobError::from(classify_azure_error(&err_str))
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, container: &str, name: &str) -> Result<Option<StoredBlob>, BlobError> {
        let blob_client = azure_storage_blob::BlobClient::new(
            &self.endpoint,
            container,
            name,
            Some(Arc::clone(&self.credential)),
            None,
        )
        .map_err(|e| BlobError::Storage(format!("blob client error: {e}")))?;

        let response = match blob_client.download(None).await {
            Ok(response) => response,
            Err(e) => {
                let err_str = e.to_string();
                if is_not_found(&err_str) {
                    debug!("blob not found");
                    return Ok(None);
                }
                error!(error = %err_str, "blob download failed");
                return Err(classify_azure_error(&err_str).into());
            }
        };

        let body: azure_core::Bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| BlobError::Storage(format!("failed to read blob body: {e}")))?;

        Ok(Some(StoredBlob {
            data: Bytes::from(body.to_vec()),
            content_type: None,
        }))
    }

    #[instrument(skip(self))]
    async fn delete(&self, container: &str, name: &str) -> Result<bool, BlobError> {
        let blob_client = self.service_client.blob_client(container, name);
        match blob_client.delete(None).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err_str = e.to_string();
                if is_not_found(&err_str) {
                    Ok(false)
                } else {
                    error!(error = %err_str, "blob delete failed");
                    Err(classify_azure_error(&err_str).into())
                }
            }
        }
    }
}
