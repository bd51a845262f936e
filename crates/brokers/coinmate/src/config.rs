use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tradelink_brokers_common::HttpTransportConfig;
use tradelink_core::{AdapterError, AdapterResult};

/// API credentials for private endpoints.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Numeric account identifier CoinMate calls `clientId`.
    #[serde(deserialize_with = "string_or_number")]
    pub client_id: Option<String>,
    /// Public key, sent as `publicKey`.
    pub api_key: Option<String>,
    /// Shared secret. Never sent, only used as the HMAC key.
    pub secret: Option<String>,
}

impl Credentials {
    pub fn new(client_id: &str, api_key: &str, secret: &str) -> Self {
        Self {
            client_id: Some(client_id.to_string()),
            api_key: Some(api_key.to_string()),
            secret: Some(secret.to_string()),
        }
    }

    /// Overlay any values present in `other`.
    pub fn merge(mut self, other: Credentials) -> Self {
        if other.client_id.is_some() {
            self.client_id = other.client_id;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.secret.is_some() {
            self.secret = other.secret;
        }
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("api_key", &self.api_key)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Adapter configuration, usually read from a TOML file.
///
/// ```toml
/// base_url = "https://coinmate.io/api"
/// trade_history_minutes = 10
///
/// [credentials]
/// client_id = 12345
/// api_key = "public-key"
/// secret = "private-key"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinmateConfig {
    pub base_url: String,
    /// Lookback window for `fetch_trades`.
    pub trade_history_minutes: u32,
    /// Minimum spacing between requests the exchange asks for. Enforced by the transport.
    pub rate_limit_ms: u64,
    pub timeout_secs: u64,
    pub credentials: Credentials,
}

impl Default for CoinmateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://coinmate.io/api".to_string(),
            trade_history_minutes: 10,
            rate_limit_ms: 1000,
            timeout_secs: 10,
            credentials: Credentials::default(),
        }
    }
}

impl CoinmateConfig {
    pub fn from_toml_str(text: &str) -> AdapterResult<Self> {
        toml::from_str(text).map_err(|e| AdapterError::Configuration(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> AdapterResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
    }
}

/// Accept `client_id = 12345` as well as `client_id = "12345"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = CoinmateConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoinmateConfig::default());
        assert_eq!(config.trade_history_minutes, 10);
        assert!(config.credentials.client_id.is_none());
    }

    #[test]
    fn test_numeric_client_id() {
        let config = CoinmateConfig::from_toml_str(
            r#"
            trade_history_minutes = 30

            [credentials]
            client_id = 12345
            api_key = "pub"
            secret = "sec"
            "#,
        )
        .unwrap();

        assert_eq!(config.trade_history_minutes, 30);
        assert_eq!(config.credentials, Credentials::new("12345", "pub", "sec"));
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let err = CoinmateConfig::from_toml_str("base_url = [").unwrap_err();
        assert!(matches!(err, AdapterError::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("1", "pub", "top-secret");
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("top-secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn test_merge_overrides_present_values_only() {
        let file = Credentials::new("1", "pub", "sec");
        let env = Credentials {
            api_key: Some("pub2".to_string()),
            ..Default::default()
        };
        let merged = file.merge(env);
        assert_eq!(merged, Credentials::new("1", "pub2", "sec"));
    }
}
