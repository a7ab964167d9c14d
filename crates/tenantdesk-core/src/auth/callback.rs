//! External-provider (OAuth-style) redirect handling.
//!
//! After the provider authenticates the user it redirects back to a callback
//! URL such as `https://app.example.com/auth/callback/github?code=abc`. The
//! provider name is the last path segment; the authorization code is then
//! exchanged server-side for a session record.

use url::Url;

use super::AuthResult;
use crate::api::RemoteAuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCallback {
    pub provider: String,
    pub code: String,
    pub state: Option<String>,
}

impl OAuthCallback {
    /// Parse a callback URL. A provider-reported `error` becomes a remote error.
    pub fn parse(callback_url: &str) -> AuthResult<Self> {
        let url = Url::parse(callback_url)
            .map_err(|e| RemoteAuthError::callback(format!("invalid callback URL: {}", e)))?;

        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut error_description = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                "error_description" => error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            let detail = match error_description {
                Some(description) => format!("{}: {}", error, description),
                None => error,
            };
            return Err(RemoteAuthError::callback(detail).into());
        }

        let provider = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .ok_or_else(|| RemoteAuthError::callback("callback URL names no provider"))?;

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| RemoteAuthError::callback("callback carried no authorization code"))?;

        Ok(Self {
            provider,
            code,
            state,
        })
    }
}
