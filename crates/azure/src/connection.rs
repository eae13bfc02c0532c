use base64::Engine;

use crate::error::AzureError;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// Parsed Azure Storage connection string.
///
/// Supports the account-key form
/// (`DefaultEndpointsProtocol=https;AccountName=..;AccountKey=..;EndpointSuffix=..`),
/// explicit `TableEndpoint`/`BlobEndpoint` overrides and
/// `UseDevelopmentStorage=true` for Azurite.
#[derive(Clone)]
pub struct StorageConnection {
    pub account_name: String,
    account_key: Vec<u8>,
    pub table_endpoint: String,
    pub blob_endpoint: String,
}

impl std::fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConnection")
            .field("account_name", &self.account_name)
            .field("account_key", &"[REDACTED]")
            .field("table_endpoint", &self.table_endpoint)
            .field("blob_endpoint", &self.blob_endpoint)
            .finish()
    }
}

impl StorageConnection {
    /// Parse a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::Configuration`] when the account name or key is
    /// missing or the key is not valid base64.
    pub fn parse(connection_string: &str) -> Result<Self, AzureError> {
        let mut protocol = "https".to_owned();
        let mut suffix = "core.windows.net".to_owned();
        let mut account_name = None;
        let mut account_key = None;
        let mut table_endpoint = None;
        let mut blob_endpoint = None;
        let mut development = false;

        for part in connection_string.split(';').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            let Some((key, value)) = part.split_once('=') else {
                return Err(AzureError::Configuration(format!(
                    "malformed connection string segment '{part}'"
                )));
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => value.trim().clone_into(&mut protocol),
                "endpointsuffix" => value.trim().clone_into(&mut suffix),
                "accountname" => account_name = Some(value.trim().to_owned()),
                "accountkey" => account_key = Some(value.trim().to_owned()),
                "tableendpoint" => table_endpoint = Some(value.trim().to_owned()),
                "blobendpoint" => blob_endpoint = Some(value.trim().to_owned()),
                "usedevelopmentstorage" => development = value.trim().eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if development {
            account_name.get_or_insert_with(|| DEV_ACCOUNT_NAME.to_owned());
            account_key.get_or_insert_with(|| DEV_ACCOUNT_KEY.to_owned());
            table_endpoint.get_or_insert_with(|| DEV_TABLE_ENDPOINT.to_owned());
            blob_endpoint.get_or_insert_with(|| DEV_BLOB_ENDPOINT.to_owned());
        }

        let account_name = account_name.ok_or_else(|| {
            AzureError::Configuration("connection string has no AccountName".to_owned())
        })?;
        let account_key = account_key.ok_or_else(|| {
            AzureError::Configuration("connection string has no AccountKey".to_owned())
        })?;
        let account_key = base64::engine::general_purpose::STANDARD
            .decode(account_key)
            .map_err(|e| AzureError::Configuration(format!("AccountKey is not base64: {e}")))?;

        let table_endpoint = table_endpoint
            .unwrap_or_else(|| format!("{protocol}://{account_name}.table.{suffix}"));
        let blob_endpoint =
            blob_endpoint.unwrap_or_else(|| format!("{protocol}://{account_name}.blob.{suffix}"));

        Ok(Self {
            account_name,
            account_key,
            table_endpoint: table_endpoint.trim_end_matches('/').to_owned(),
            blob_endpoint: blob_endpoint.trim_end_matches('/').to_owned(),
        })
    }

    pub(crate) fn account_key(&self) -> &[u8] {
        &self.account_key
    }
}
