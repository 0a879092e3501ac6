//! bxt server API
//!
//! [`BackendService`] abstracts the endpoints the push flow depends on so
//! the coordinator can run against the HTTP client or a test double.

mod http;

pub use http::{DEFAULT_TIMEOUT_SECS, HttpBackend};

use crate::error::Result;
use crate::submit::SubmissionPayload;
use crate::types::SectionAddress;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upload progress sink, called with `(bytes_sent, bytes_total)`
pub type UploadProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Response of `POST /api/packages/commit`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    /// "ok" on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Older servers report the outcome under `result`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl CommitResponse {
    /// Response carrying `{"status": "ok"}`
    pub fn ok() -> Self {
        Self {
            status: Some("ok".to_string()),
            result: None,
        }
    }

    /// Whether the server applied the commit
    pub fn is_ok(&self) -> bool {
        self.status.as_deref().or(self.result.as_deref()) == Some("ok")
    }

    /// Reported status, for error messages
    pub fn describe(&self) -> &str {
        self.status
            .as_deref()
            .or(self.result.as_deref())
            .unwrap_or("missing status")
    }
}

/// Body of `POST /api/packages/snap/branch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapRequest {
    /// Branch to copy from
    pub source_branch: String,
    /// Branch to overwrite
    pub target_branch: String,
    /// Architecture to snapshot
    pub architecture: String,
}

/// Server operations used by the staging workflow
#[async_trait]
pub trait BackendService: Send + Sync {
    /// List every section the server knows
    async fn list_sections(&self) -> Result<Vec<SectionAddress>>;

    /// Refresh the session credential
    async fn refresh_auth(&self) -> Result<()>;

    /// Submit an encoded commit, reporting upload progress
    async fn commit(
        &self,
        payload: &SubmissionPayload,
        progress: UploadProgress,
    ) -> Result<CommitResponse>;

    /// Trigger a sync with upstream repositories
    async fn sync(&self) -> Result<()>;

    /// Snapshot one branch onto another
    async fn snap(&self, request: &SnapRequest) -> Result<()>;
}
