//! HTTP client for the Ghars REST API.

use async_trait::async_trait;
use ghars_core::UserId;
use ghars_session::{ApiConfig, ApiError, Credential, Identity, SessionApi, decode};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::ClientError;
use crate::wire::{
    PasswordForm, PointsAward, ProfileRecord, StudentRecord, TokenResponse, error_detail,
};

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Which statuses mean "this credential is dead" for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionPolicy {
    /// Only `401`. A `403` is a permission denial for a live credential.
    UnauthorizedOnly,
    /// `401` and `403`. Used where the server answers `403` for a token it
    /// cannot validate and no capability check applies.
    UnauthorizedOrForbidden,
}

/// Maps a non-success response onto an `ApiError`.
#[must_use]
pub fn classify_status(status: StatusCode, body: &str, policy: RejectionPolicy) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN if policy == RejectionPolicy::UnauthorizedOrForbidden => {
            ApiError::Unauthorized
        }
        StatusCode::FORBIDDEN => ApiError::Forbidden {
            detail: error_detail(body),
        },
        StatusCode::NOT_FOUND => ApiError::NotFound {
            detail: error_detail(body),
        },
        other => ApiError::Status {
            status: other.as_u16(),
            detail: error_detail(body),
        },
    }
}

/// Client for the Ghars REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s), the API key is not a
    /// valid header value, or the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, Report<ClientError>> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
            }
            .into());
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key).map_err(|_| ClientError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let builder = reqwest::Client::builder().default_headers(headers);
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(std::time::Duration::from_secs(config.timeout_secs));
        let http = builder.build().map_err(|e| ClientError::Http {
            reason: e.to_string(),
        })?;

        Ok(Self { http, base_url })
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Returns the current student's own record.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the call.
    #[instrument(skip_all)]
    pub async fn student_me(&self, credential: &Credential) -> Result<StudentRecord, ApiError> {
        let request = self
            .http
            .get(self.url("/students/me"))
            .bearer_auth(credential.as_str());
        self.send(request, RejectionPolicy::UnauthorizedOnly).await
    }

    /// Lists all students. Requires the manage-students capability.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the call.
    #[instrument(skip_all)]
    pub async fn list_students(
        &self,
        credential: &Credential,
    ) -> Result<Vec<StudentRecord>, ApiError> {
        let request = self
            .http
            .get(self.url("/admin/students"))
            .bearer_auth(credential.as_str());
        self.send(request, RejectionPolicy::UnauthorizedOnly).await
    }

    /// Adds points to a student's balance and returns the updated record.
    /// Requires the manage-points capability.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the call.
    #[instrument(skip(self, credential))]
    pub async fn award_points(
        &self,
        credential: &Credential,
        student: UserId,
        points: i64,
    ) -> Result<StudentRecord, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/admin/students/{student}/add-points")))
            .bearer_auth(credential.as_str())
            .json(&PointsAward { points });
        self.send(request, RejectionPolicy::UnauthorizedOnly).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        policy: RejectionPolicy,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_status(status, &body, policy);
            debug!(status = status.as_u16(), error = %error, "Request failed");
            return Err(error);
        }

        let body = response.text().await.map_err(network_error)?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            reason: e.to_string(),
        })
    }
}

fn network_error(err: reqwest::Error) -> ApiError {
    ApiError::Network {
        reason: err.to_string(),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SessionApi for ApiClient {
    #[instrument(skip_all)]
    async fn issue_credential(&self, password: &str) -> Result<Credential, ApiError> {
        let request = self
            .http
            .post(self.url("/token"))
            .form(&PasswordForm::new(password));
        let token: TokenResponse = self.send(request, RejectionPolicy::UnauthorizedOnly).await?;

        let credential = Credential::new(token.access_token);
        if credential.is_blank() {
            return Err(ApiError::Decode {
                reason: "token response carried an empty access token".to_string(),
            });
        }
        Ok(credential)
    }

    /// The profile body has no role or capability flags; both come from the
    /// claims of the credential sent on this call.
    #[instrument(skip_all)]
    async fn who_am_i(&self, credential: &Credential) -> Result<Identity, ApiError> {
        let claims = decode(credential).map_err(|e| {
            debug!(reason = %e.reason, "Refusing to send an undecodable credential");
            ApiError::Unauthorized
        })?;

        let request = self
            .http
            .get(self.url("/profile/"))
            .bearer_auth(credential.as_str());
        let record: ProfileRecord = self
            .send(request, RejectionPolicy::UnauthorizedOrForbidden)
            .await?;

        if record.id != claims.subject_id() {
            warn!(
                profile_id = %record.id,
                subject_id = %claims.subject_id(),
                "Profile id does not match the credential subject"
            );
        }
        Ok(record.into_identity(&claims))
    }
}
