use std::fmt;

use serde::{Deserialize, Serialize};

use super::AuthResult;
use crate::token;

/// Identity and profile attributes of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Access and refresh token, always replaced together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// The authenticated identity held by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

impl SessionRecord {
    /// A record is only valid when every required field is populated.
    pub fn is_complete(&self) -> bool {
        !self.user.id.is_empty()
            && !self.tokens.access_token.is_empty()
            && !self.tokens.refresh_token.is_empty()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.user.roles.iter().any(|r| r == role)
    }

    /// Expiry of the access token in seconds since the epoch.
    pub fn expires_at(&self) -> AuthResult<i64> {
        token::decode_expiry(&self.tokens.access_token)
    }

    /// Seconds left on the access token (for display). Zero once expired.
    pub fn seconds_until_expiry(&self, now: i64) -> i64 {
        self.expires_at().map(|exp| exp.saturating_sub(now).max(0)).unwrap_or(0)
    }

    pub fn display_name(&self) -> &str {
        self.user
            .name
            .as_deref()
            .or(self.user.email.as_deref())
            .unwrap_or(&self.user.id)
    }
}

/// Email/password pair submitted to the sign-in endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Lifecycle state of the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    /// A refresh exchange is in flight; the prior record is still held.
    Refreshing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated => "authenticated",
            SessionState::Refreshing => "refreshing",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::testing::mint;

    #[test]
    fn test_parse_minimal_record() {
        let json = r#"{"user": {"id": "u1", "roles": []}, "tokens": {"access_token": "a.b.c", "refresh_token": "r1"}}"#;
        let record: SessionRecord = serde_json::from_str(json).expect("minimal record should parse");
        assert_eq!(record.user.id, "u1");
        assert!(record.user.email.is_none());
        assert!(record.user.roles.is_empty());
        assert_eq!(record.tokens.refresh_token, "r1");
        assert!(record.is_complete());
    }

    #[test]
    fn test_parse_record_without_roles() {
        let json = r#"{"user": {"id": "u1", "email": "a@b.com", "tenant_id": "t9"}, "tokens": {"access_token": "x", "refresh_token": "y"}}"#;
        let record: SessionRecord = serde_json::from_str(json).expect("record should parse");
        assert!(record.user.roles.is_empty());
        assert_eq!(record.user.tenant_id.as_deref(), Some("t9"));
        assert_eq!(record.display_name(), "a@b.com");
    }

    #[test]
    fn test_parse_rejects_missing_tokens() {
        let json = r#"{"user": {"id": "u1"}}"#;
        assert!(serde_json::from_str::<SessionRecord>(json).is_err());
    }

    #[test]
    fn test_incomplete_records() {
        let mut record = crate::testing::record("u1", 100, "r1");
        assert!(record.is_complete());

        record.tokens.refresh_token.clear();
        assert!(!record.is_complete());

        let mut record = crate::testing::record("", 100, "r1");
        assert!(!record.is_complete());
        record.user.id = "u1".to_string();
        record.tokens.access_token.clear();
        assert!(!record.is_complete());
    }

    #[test]
    fn test_has_role() {
        let mut record = crate::testing::record("u1", 100, "r1");
        record.user.roles = vec!["owner".to_string(), "billing".to_string()];
        assert!(record.has_role("billing"));
        assert!(!record.has_role("Billing"));
        assert!(!record.has_role("admin"));
    }

    #[test]
    fn test_seconds_until_expiry() {
        let record = crate::testing::record("u1", 1_000, "r1");
        assert_eq!(record.expires_at().unwrap(), 1_000);
        assert_eq!(record.seconds_until_expiry(400), 600);
        assert_eq!(record.seconds_until_expiry(2_000), 0);
    }

    #[test]
    fn test_seconds_until_expiry_extreme_claims() {
        let mut record = crate::testing::record("u1", i64::MIN, "r1");
        assert_eq!(record.seconds_until_expiry(1_700_000_000), 0);

        record.tokens.access_token = crate::token::testing::with_payload(r#"{"exp":-1e300}"#);
        assert_eq!(record.expires_at().unwrap(), i64::MIN);
        assert_eq!(record.seconds_until_expiry(1_700_000_000), 0);

        let record = crate::testing::record("u1", i64::MAX, "r1");
        assert_eq!(record.seconds_until_expiry(-1), i64::MAX);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("a@b.com", "hunter2");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("a@b.com"));
        assert!(!shown.contains("hunter2"));

        let pair = TokenPair {
            access_token: mint(5),
            refresh_token: "r1".to_string(),
        };
        assert!(!format!("{:?}", pair).contains("r1"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Refreshing.to_string(), "refreshing");
    }
}
