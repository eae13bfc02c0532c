use serde::{Deserialize, Serialize};

/// Shared Azure settings: optional service principal credentials and an
/// endpoint override for local development (e.g. `Azurite`).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AzureBaseConfig {
    /// Entra ID tenant ID.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Application (client) ID. Redacted in `Debug`.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client credential (service principal). Redacted in `Debug`.
    #[serde(default)]
    pub client_credential: Option<String>,

    /// Endpoint URL override.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for AzureBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBaseConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id.as_ref().map(|_| "[REDACTED]"))
            .field(
                "client_credential",
                &self.client_credential.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl AzureBaseConfig {
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn with_client_credential(mut self, client_credential: impl Into<String>) -> Self {
        self.client_credential = Some(client_credential.into());
        self
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// `true` when all three service principal fields are set.
    pub fn has_service_principal(&self) -> bool {
        self.tenant_id.is_some() && self.client_id.is_some() && self.client_credential.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let config = AzureBaseConfig::default()
            .with_tenant_id("tid-123")
            .with_client_id("cid-456")
            .with_client_credential("cred-789")
            .with_endpoint_url("http://127.0.0.1:10000/devstoreaccount1");
        assert_eq!(config.tenant_id.as_deref(), Some("tid-123"));
        assert_eq!(config.client_id.as_deref(), Some("cid-456"));
        assert_eq!(config.client_credential.as_deref(), Some("cred-789"));
        assert!(config.has_service_principal());
    }

    #[test]
    fn partial_principal_is_not_enough() {
        let config = AzureBaseConfig::default().with_tenant_id("tid");
        assert!(!config.has_service_principal());
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = AzureBaseConfig::default()
            .with_client_id("my-app-id")
            .with_client_credential("super-private");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("my-app-id"));
        assert!(!debug.contains("super-private"));
    }

    #[test]
    fn deserializes_from_toml_style_json() {
        let config: AzureBaseConfig =
            serde_json::from_str(r#"{"tenant_id":"t","endpoint_url":"http://azurite:10000"}"#)
                .unwrap();
        assert_eq!(config.tenant_id.as_deref(), Some("t"));
        assert!(config.client_id.is_none());
    }
}
