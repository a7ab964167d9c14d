//! Route guards.
//!
//! A guard sits in front of protected content. It asks the session manager
//! for a valid session and either lets the caller through or names where to
//! send them instead: the sign-in entry point when there is no usable
//! session, or the not-authorized view when the session lacks a required
//! role. Guards read the session; they never sign in or out themselves.

use tracing::debug;
use url::form_urlencoded;

use crate::auth::{SessionManager, SessionRecord};

pub const DEFAULT_SIGN_IN_PATH: &str = "/auth/sign-in";
pub const DEFAULT_NOT_AUTHORIZED_PATH: &str = "/not-authorized";

/// Where a denied caller should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    SignIn { location: String },
    NotAuthorized { location: String },
}

impl Redirect {
    pub fn location(&self) -> &str {
        match self {
            Redirect::SignIn { location } | Redirect::NotAuthorized { location } => location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(SessionRecord),
    Redirect(Redirect),
}

/// Performs the navigation side effect of a denied guard.
pub trait Navigator {
    fn navigate(&self, redirect: &Redirect);
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    path: String,
    required_roles: Vec<String>,
    sign_in_path: String,
    not_authorized_path: String,
}

impl RouteGuard {
    /// Guard for `path` that only requires a valid session.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            required_roles: Vec::new(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            not_authorized_path: DEFAULT_NOT_AUTHORIZED_PATH.to_string(),
        }
    }

    /// Also require one of the given roles. Roles accumulate (any-of).
    pub fn require_role(mut self, role: impl Into<String>) -> Self {
        self.required_roles.push(role.into());
        self
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    pub fn with_not_authorized_path(mut self, path: impl Into<String>) -> Self {
        self.not_authorized_path = path.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn permits(&self, record: &SessionRecord) -> bool {
        self.required_roles.is_empty() || self.required_roles.iter().any(|role| record.has_role(role))
    }

    fn sign_in_redirect(&self) -> Redirect {
        let return_to: String = form_urlencoded::byte_serialize(self.path.as_bytes()).collect();
        Redirect::SignIn {
            location: format!("{}?redirect_to={}", self.sign_in_path, return_to),
        }
    }

    pub async fn check(&self, manager: &SessionManager) -> GuardDecision {
        match manager.check_auth().await {
            Ok(record) if self.permits(&record) => GuardDecision::Allow(record),
            Ok(record) => {
                debug!(path = %self.path, user_id = %record.user.id, required = ?self.required_roles, "Missing required role");
                GuardDecision::Redirect(Redirect::NotAuthorized {
                    location: self.not_authorized_path.clone(),
                })
            }
            Err(e) => {
                debug!(path = %self.path, error = %e, "No usable session");
                GuardDecision::Redirect(self.sign_in_redirect())
            }
        }
    }

    /// Check, navigate away if denied, and hand back the record if allowed.
    pub async fn enforce(&self, manager: &SessionManager, navigator: &dyn Navigator) -> Option<SessionRecord> {
        match self.check(manager).await {
            GuardDecision::Allow(record) => Some(record),
            GuardDecision::Redirect(redirect) => {
                navigator.navigate(&redirect);
                None
            }
        }
    }
}
