use std::fmt;

use serde_json::Value;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Substring the auth backend uses when a request carried no usable session.
const SESSION_MISSING_SIGNATURE: &str = "auth session missing";

/// Error returned by the remote auth service, or by the transport talking to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAuthError {
    /// HTTP status, if a response was received at all
    pub status: Option<u16>,
    pub detail: String,
}

impl RemoteAuthError {
    pub fn new(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build from a non-success response. Prefers the JSON `message`,
    /// `detail`, `error_description` or `error` field over the raw body.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            ["message", "detail", "error_description", "error"]
                .iter()
                .find_map(|field| json.get(*field).and_then(Value::as_str).map(str::to_string))
        });
        let detail = match message {
            Some(message) => Self::truncate_body(&message),
            None if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            None => Self::truncate_body(body),
        };
        Self::new(Some(status.as_u16()), detail)
    }

    /// A 2xx response whose body was not a usable session record.
    pub fn invalid_response(detail: impl Into<String>) -> Self {
        Self::new(None, format!("invalid response: {}", detail.into()))
    }

    /// A provider redirect that cannot be exchanged.
    pub fn callback(detail: impl Into<String>) -> Self {
        Self::new(None, detail)
    }

    /// HTTP 401 or 403.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }

    pub fn is_session_missing(&self) -> bool {
        self.detail.to_lowercase().contains(SESSION_MISSING_SIGNATURE)
    }
}

impl From<reqwest::Error> for RemoteAuthError {
    fn from(err: reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("unable to connect: {}", err)
        } else {
            format!("network error: {}", err)
        };
        Self::new(err.status().map(|s| s.as_u16()), detail)
    }
}

impl fmt::Display for RemoteAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "Auth service error (HTTP {}): {}", status, self.detail),
            None => write!(f, "Auth service error: {}", self.detail),
        }
    }
}

impl std::error::Error for RemoteAuthError {}
