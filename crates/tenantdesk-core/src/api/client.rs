//! HTTP client for the remote auth service.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Serialize;
use tracing::{debug, warn};

use super::{AuthService, RemoteAuthError};
use crate::auth::{AuthResult, Credentials, SessionRecord};

// ============================================================================
// Constants
// ============================================================================

const SIGNIN_PATH: &str = "/api/auth/signin";
const REFRESH_PATH: &str = "/api/auth/refresh-token";
const CALLBACK_PATH: &str = "/api/auth/callback";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct CodeExchangeRequest<'a> {
    code: &'a str,
}

/// Auth service client over HTTP.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpAuthService {
    client: Client,
    base_url: String,
}

impl HttpAuthService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> AuthResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let err = RemoteAuthError::from_status(status, &body);
            warn!(status = %status, detail = %err.detail, "Auth service rejected request");
            Err(err.into())
        }
    }

    async fn post_session<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AuthResult<SessionRecord> {
        let url = self.url(path);
        debug!(url = %url, "Posting to auth service");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(RemoteAuthError::from)?;

        let response = Self::check_response(response).await?;

        let record: SessionRecord = response.json().await.map_err(|e| {
            RemoteAuthError::invalid_response(format!("failed to parse session from {}: {}", url, e))
        })?;

        if !record.is_complete() {
            return Err(RemoteAuthError::invalid_response("incomplete session record").into());
        }
        Ok(record)
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<SessionRecord> {
        self.post_session(SIGNIN_PATH, credentials).await
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionRecord> {
        self.post_session(REFRESH_PATH, &RefreshRequest { refresh_token }).await
    }

    async fn exchange_code(&self, provider: &str, code: &str) -> AuthResult<SessionRecord> {
        let valid_provider = !provider.is_empty()
            && provider
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_provider {
            return Err(RemoteAuthError::callback(format!("unsupported provider name: {}", provider)).into());
        }

        let path = format!("{}/{}", CALLBACK_PATH, provider);
        self.post_session(&path, &CodeExchangeRequest { code }).await
    }
}
