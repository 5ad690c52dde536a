//! Client configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (`GHARS__API__BASE_URL`, `GHARS__SESSION__STORAGE_KEY`,
//! ...). Every field has a default so an empty environment yields a working
//! local setup.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `X-API-KEY` header, if the deployment requires one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds. Ignored in the browser, where the fetch
    /// API has no timeout knob.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Key the credential is persisted under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Clock skew tolerated before a locally expired credential is dropped
    /// without asking the server.
    #[serde(default = "default_expiry_leeway_secs")]
    pub expiry_leeway_secs: i64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_storage_key() -> String {
    "token".to_string()
}

fn default_expiry_leeway_secs() -> i64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            expiry_leeway_secs: default_expiry_leeway_secs(),
        }
    }
}

impl SessionConfig {
    /// Returns the expiry leeway as a duration.
    ///
    /// Negative values clamp to zero; values too large to represent fall
    /// back to the default.
    #[must_use]
    pub fn expiry_leeway(&self) -> Duration {
        Duration::try_seconds(self.expiry_leeway_secs.max(0))
            .or_else(|| Duration::try_seconds(default_expiry_leeway_secs()))
            .unwrap_or_default()
    }
}

impl ClientConfig {
    /// Loads configuration from `GHARS__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("GHARS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Loads configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn from_toml(document: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert!(config.api.api_key.is_none());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.session.storage_key, "token");
        assert_eq!(config.session.expiry_leeway(), Duration::seconds(60));
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = ClientConfig::from_toml("").expect("load");
        assert_eq!(config.session.storage_key, "token");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            [api]
            base_url = "https://api.example.test/api/v1"
            api_key = "k"

            [session]
            expiry_leeway_secs = 5
            "#,
        )
        .expect("load");

        assert_eq!(config.api.base_url, "https://api.example.test/api/v1");
        assert_eq!(config.api.api_key.as_deref(), Some("k"));
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.session.storage_key, "token");
        assert_eq!(config.session.expiry_leeway(), Duration::seconds(5));
    }

    #[test]
    fn negative_leeway_clamps_to_zero() {
        let config = SessionConfig {
            expiry_leeway_secs: -10,
            ..SessionConfig::default()
        };
        assert_eq!(config.expiry_leeway(), Duration::zero());
    }

    #[test]
    fn unrepresentable_leeway_falls_back_to_default() {
        let config = SessionConfig {
            expiry_leeway_secs: i64::MAX,
            ..SessionConfig::default()
        };
        assert_eq!(config.expiry_leeway(), Duration::seconds(60));
    }
}
