//! Remote auth service module.
//!
//! This module provides the `AuthService` trait the session manager talks to,
//! and `HttpAuthService`, its implementation over the product's REST API:
//!
//! - `POST /api/auth/signin` with `{email, password}`
//! - `POST /api/auth/refresh-token` with `{refresh_token}`
//! - `POST /api/auth/callback/{provider}` with `{code}`
//!
//! Each returns a session record on success.

pub mod client;
pub mod error;
pub mod service;

pub use client::HttpAuthService;
pub use error::RemoteAuthError;
pub use service::AuthService;
