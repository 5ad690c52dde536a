//! Build-time configuration for the browser client.
//!
//! The browser has no process environment, so deployment settings are baked
//! in when the bundle is compiled:
//!
//! - `GHARS_API_BASE_URL`: REST API base URL
//! - `GHARS_API_KEY`: value of the `X-API-KEY` header
//! - `GHARS_STORAGE_KEY`: `localStorage` key of the credential
//! - `GHARS_LOG`: tracing filter directives (default `info`)

use ghars_session::ClientConfig;

/// Default tracing filter when `GHARS_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns the client configuration baked into this build.
#[must_use]
pub fn client_config() -> ClientConfig {
    with_overrides(
        option_env!("GHARS_API_BASE_URL"),
        option_env!("GHARS_API_KEY"),
        option_env!("GHARS_STORAGE_KEY"),
    )
}

/// Returns the tracing filter baked into this build.
#[must_use]
pub fn log_filter() -> &'static str {
    option_env!("GHARS_LOG").unwrap_or(DEFAULT_LOG_FILTER)
}

fn with_overrides(
    base_url: Option<&str>,
    api_key: Option<&str>,
    storage_key: Option<&str>,
) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(base_url) = base_url.filter(|v| !v.is_empty()) {
        config.api.base_url = base_url.to_string();
    }
    if let Some(api_key) = api_key.filter(|v| !v.is_empty()) {
        config.api.api_key = Some(api_key.to_string());
    }
    if let Some(storage_key) = storage_key.filter(|v| !v.is_empty()) {
        config.session.storage_key = storage_key.to_string();
    }
    config
}
