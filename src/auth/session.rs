//! Session tokens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login request body for `POST /api/auth`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// User name
    pub name: &'a str,
    /// Password
    pub password: &'a str,
    /// "bearer" makes the server return tokens in the body instead of cookies
    pub response_type: &'a str,
}

/// Tokens returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    /// Short-lived access token
    pub access_token: String,
    /// Long-lived refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token type, normally "bearer"
    #[serde(default)]
    pub token_type: Option<String>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Name the session was opened with
    pub user: String,
    /// Token sent as `Authorization: Bearer`
    pub access_token: String,
    /// Token used by `GET /api/auth/refresh`
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// When the access token was last issued
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Session from a fresh token response
    pub fn from_tokens(user: impl Into<String>, tokens: TokenResponse) -> Self {
        Self {
            user: user.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            issued_at: Utc::now(),
        }
    }

    /// Session for a bare access token (no refresh token)
    pub fn from_access_token(token: impl Into<String>) -> Self {
        Self {
            user: String::new(),
            access_token: token.into(),
            refresh_token: None,
            issued_at: Utc::now(),
        }
    }

    /// Apply refreshed tokens, keeping the old refresh token if none was sent
    pub fn renew(&mut self, tokens: TokenResponse) {
        self.access_token = tokens.access_token;
        if tokens.refresh_token.is_some() {
            self.refresh_token = tokens.refresh_token;
        }
        self.issued_at = Utc::now();
    }

    /// Token to present on refresh
    pub fn refresh_credential(&self) -> &str {
        self.refresh_token.as_deref().unwrap_or(&self.access_token)
    }
}
