//! Authentication against a bxt server
//!
//! Supports a stored login session and the `BXT_TOKEN` environment variable.

mod session;

pub use session::{LoginRequest, Session, TokenResponse};

use crate::error::{Error, Result};
use crate::state::StateDir;
use std::env;

/// Environment variable holding an access token
pub const TOKEN_ENV: &str = "BXT_TOKEN";

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from environment variable
    EnvVar,
    /// Session saved by `bxt-stage login`
    Stored,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session to use
    pub session: Session,
    /// Where the session was obtained from
    pub source: AuthSource,
}

/// Get authentication
///
/// Priority:
/// 1. `BXT_TOKEN` environment variable
/// 2. Session stored by `bxt-stage login`
pub fn get_auth(state: &StateDir) -> Result<AuthConfig> {
    if let Ok(token) = env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Ok(AuthConfig {
                session: Session::from_access_token(token.trim()),
                source: AuthSource::EnvVar,
            });
        }
    }

    match state.load_session()? {
        Some(session) => Ok(AuthConfig {
            session,
            source: AuthSource::Stored,
        }),
        None => Err(Error::NotLoggedIn),
    }
}
