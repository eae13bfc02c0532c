use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use jawn_state::{CONTENT_TABLE, ContentEntity, ContentTable, StateError};

use crate::connection::StorageConnection;
use crate::error::{AzureError, classify_azure_error};

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2019-02-02";
const ACCEPT_NO_METADATA: &str = "application/json;odata=nometadata";
const CONTINUATION_PARTITION: &str = "x-ms-continuation-NextPartitionKey";
const CONTINUATION_ROW: &str = "x-ms-continuation-NextRowKey";

/// Characters escaped inside a quoted key literal in an entity path.
const KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Deserialize)]
struct QueryPage {
    #[serde(default)]
    value: Vec<serde_json::Value>,
}

/// [`ContentTable`] backed by Azure Table Storage through its REST API.
///
/// Requests are signed with Shared Key Lite using the account key from the
/// connection string, so the same client works against Azurite.
pub struct AzureContentTable {
    client: Client,
    connection: StorageConnection,
    table_name: String,
}

impl std::fmt::Debug for AzureContentTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureContentTable")
            .field("connection", &self.connection)
            .field("table_name", &self.table_name)
            .finish_non_exhaustive()
    }
}

impl AzureContentTable {
    /// Create a client for the `Content` table.
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::Configuration`] if the HTTP client cannot be built.
    pub fn new(connection: StorageConnection) -> Result<Self, AzureError> {
        Self::with_table_name(connection, CONTENT_TABLE)
    }

    /// Create a client for an arbitrary table.
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::Configuration`] if the HTTP client cannot be built.
    pub fn with_table_name(
        connection: StorageConnection,
        table_name: impl Into<String>,
    ) -> Result<Self, AzureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AzureError::Configuration(format!("http client error: {e}")))?;
        Ok(Self {
            client,
            connection,
            table_name: table_name.into(),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn url(&self, resource: &str) -> Result<Url, AzureError> {
        let raw = format!("{}/{resource}", self.connection.table_endpoint);
        Url::parse(&raw).map_err(|e| AzureError::Configuration(format!("bad table URL {raw}: {e}")))
    }

    fn entity_resource(&self, partition_key: &str, row_key: &str) -> String {
        format!(
            "{}(PartitionKey='{}',RowKey='{}')",
            self.table_name,
            encode_key(partition_key),
            encode_key(row_key)
        )
    }

    /// Build a signed request.
    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, AzureError> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let authorization = shared_key_lite(&self.connection, &date, url.path())?;
        Ok(self
            .client
            .request(method, url)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("Accept", ACCEPT_NO_METADATA)
            .header("DataServiceVersion", "3.0;NetFx")
            .header("MaxDataServiceVersion", "3.0;NetFx")
            .header("Authorization", authorization))
    }

    async fn send(request: RequestBuilder) -> Result<Response, AzureError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                AzureError::Timeout
            } else if e.is_connect() {
                AzureError::Connection(e.to_string())
            } else {
                classify_azure_error(&e.to_string())
            }
        })
    }
}

/// Escape a key for use inside `PartitionKey='..'`: quotes are doubled, then
/// the value is percent-encoded.
fn encode_key(key: &str) -> String {
    utf8_percent_encode(&key.replace('\'', "''"), KEY_ESCAPE).to_string()
}

/// `Authorization` header value for the Shared Key Lite scheme.
///
/// The string to sign is the date followed by the canonicalized resource
/// `/{account}{path}`.
fn shared_key_lite(
    connection: &StorageConnection,
    date: &str,
    path: &str,
) -> Result<String, AzureError> {
    let string_to_sign = format!("{date}\n/{}{path}", connection.account_name);
    let mut mac = HmacSha256::new_from_slice(connection.account_key())
        .map_err(|e| AzureError::Configuration(format!("invalid account key: {e}")))?;
    mac.update(string_to_sign.as_bytes());
    let signature = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
    Ok(format!(
        "SharedKeyLite {}:{signature}",
        connection.account_name
    ))
}

async fn status_error(response: Response) -> AzureError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => AzureError::Throttled,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AzureError::Timeout,
        _ => AzureError::Service(format!("HTTP {status}: {body}")),
    }
}

/// Serialize an entity for an insert-or-replace request, annotating the
/// published date so the service stores it as `Edm.DateTime`.
fn entity_body(entity: &ContentEntity) -> Result<serde_json::Value, StateError> {
    let mut body = serde_json::to_value(entity)?;
    if let Some(map) = body.as_object_mut() {
        map.insert(
            "PublishedDate@odata.type".to_owned(),
            serde_json::Value::String("Edm.DateTime".to_owned()),
        );
    }
    Ok(body)
}

#[async_trait]
impl ContentTable for AzureContentTable {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn ensure_table(&self) -> Result<(), StateError> {
        let request = self
            .request(Method::POST, self.url("Tables")?)?
            .header("Prefer", "return-no-content")
            .json(&serde_json::json!({ "TableName": self.table_name }));
        let response = Self::send(request).await?;
        match response.status() {
            StatusCode::CONFLICT => {
                debug!("table already exists");
                Ok(())
            }
            s if s.is_success() => {
                debug!("table created");
                Ok(())
            }
            _ => Err(status_error(response).await.into()),
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn get(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<ContentEntity>, StateError> {
        let url = self.url(&self.entity_resource(partition_key, row_key))?;
        let response = Self::send(self.request(Method::GET, url)?).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await.into());
        }
        let etag = response
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let mut entity: ContentEntity = response
            .json()
            .await
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        entity.etag = etag;
        Ok(Some(entity))
    }

    #[instrument(skip(self, entity), fields(table = %self.table_name, row_key = %entity.row_key))]
    async fn upsert(&self, entity: &ContentEntity) -> Result<(), StateError> {
        let url = self.url(&self.entity_resource(&entity.partition_key, &entity.row_key))?;
        let request = self
            .request(Method::PUT, url)?
            .json(&entity_body(entity)?);
        let response = Self::send(request).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await.into());
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn scan(&self) -> Result<Vec<ContentEntity>, StateError> {
        let mut rows = Vec::new();
        let mut continuation: Option<(String, Option<String>)> = None;

        loop {
            let mut url = self.url(&format!("{}()", self.table_name))?;
            if let Some((next_partition, next_row)) = &continuation {
                let mut query = url.query_pairs_mut();
                query.append_pair("NextPartitionKey", next_partition);
                if let Some(next_row) = next_row {
                    query.append_pair("NextRowKey", next_row);
                }
            }

            let response = Self::send(self.request(Method::GET, url)?).await?;
            if !response.status().is_success() {
                return Err(status_error(response).await.into());
            }
            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
            };
            let next_partition = header(CONTINUATION_PARTITION);
            let next_row = header(CONTINUATION_ROW);

            let page: QueryPage = response
                .json()
                .await
                .map_err(|e| StateError::Serialization(e.to_string()))?;
            for value in page.value {
                match serde_json::from_value::<ContentEntity>(value) {
                    Ok(entity) => rows.push(entity),
                    Err(e) => warn!(error = %e, "skipping undecodable table row"),
                }
            }

            match next_partition {
                Some(p) => continuation = Some((p, next_row)),
                None => break,
            }
        }

        debug!(count = rows.len(), "table scan complete");
        Ok(rows)
    }
}
