//! Error types for bxt-stage

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while staging, encoding or pushing commits
#[derive(Debug, Error)]
pub enum Error {
    /// An add entry is missing required fields; nothing was sent
    #[error("Missing fields for package {package}: {}", fields.join(", "))]
    MissingFields {
        /// Name of the offending package
        package: String,
        /// Labels of the missing fields
        fields: Vec<&'static str>,
    },

    /// A package name ended up in more than one action bucket
    ///
    /// Callers route each name to a single bucket before merging, so this
    /// always indicates a bug in the caller.
    #[error("commit contains duplicate package name: {package}")]
    ConflictingActions {
        /// The duplicated package name
        package: String,
    },

    /// Section is missing one of branch/repository/architecture
    #[error("incomplete section: {0}")]
    IncompleteSection(String),

    /// Section does not exist on the server
    #[error("section not found: {0}")]
    SectionNotFound(String),

    /// Package is not staged in the given section
    #[error("package not staged: {0}")]
    PackageNotStaged(String),

    /// A push is already running
    #[error("a push is already in progress")]
    PushInFlight,

    /// Server rejected the credentials (HTTP 401)
    #[error("not authorized, run `bxt-stage login` again")]
    Unauthorized,

    /// No stored session
    #[error("not logged in, run `bxt-stage login` first")]
    NotLoggedIn,

    /// Server answered with an error status or a non-ok result
    #[error("server error: {0}")]
    Backend(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::Config(format!("invalid server URL: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message() {
        let err = Error::MissingFields {
            package: "foo-1.0.pkg".to_string(),
            fields: vec!["package file", "signature file"],
        };
        assert_eq!(
            err.to_string(),
            "Missing fields for package foo-1.0.pkg: package file, signature file"
        );
    }
}
