use async_trait::async_trait;

use crate::auth::{AuthResult, Credentials, SessionRecord};

/// The remote collaborator that issues and exchanges session records.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<SessionRecord>;

    /// Exchange a refresh token for a new session. Refresh tokens are
    /// single-use on most backends.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionRecord>;

    /// Exchange an external provider's authorization code for a session.
    async fn exchange_code(&self, provider: &str, code: &str) -> AuthResult<SessionRecord>;
}
