//! Progress callback trait for interface-agnostic updates
//!
//! This trait allows different interfaces (CLI, tests, etc.) to receive
//! progress updates while a push runs.

use crate::error::Error;
use async_trait::async_trait;
use std::fmt;

/// Push phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Building the multipart payload
    Encoding,
    /// Refreshing the session before the upload
    RefreshingAuth,
    /// Streaming the commit to the server
    Uploading,
    /// Server accepted the commit
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Encoding => "Encoding commits",
            Self::RefreshingAuth => "Refreshing session",
            Self::Uploading => "Uploading",
            Self::Complete => "Done",
        };
        f.write_str(text)
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during a push.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called with the uploaded fraction (`0.0..=1.0`, never decreasing)
    async fn on_upload_progress(&self, fraction: f64);

    /// Called when the push fails
    async fn on_error(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_upload_progress(&self, _fraction: f64) {}
    async fn on_error(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}
