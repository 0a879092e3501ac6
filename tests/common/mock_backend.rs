//! Mock backend service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use bxt_stage::backend::{BackendService, CommitResponse, SnapRequest, UploadProgress};
use bxt_stage::error::{Error, Result};
use bxt_stage::submit::SubmissionPayload;
use bxt_stage::types::SectionAddress;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Calls in the order they were made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListSections,
    RefreshAuth,
    Commit,
    Sync,
    Snap(SnapRequest),
}

/// Simple mock backend
///
/// Features:
/// - Call tracking for verification
/// - Recorded commit payloads
/// - Scripted upload progress
/// - Error injection for failure path testing
/// - Optional gate holding the commit open until released
pub struct MockBackend {
    sections: Mutex<Vec<SectionAddress>>,
    calls: Mutex<Vec<Call>>,
    payloads: Mutex<Vec<SubmissionPayload>>,
    progress_script: Mutex<Vec<(u64, u64)>>,
    commit_response: Mutex<CommitResponse>,
    // Error injection
    error_on_refresh: Mutex<Option<Error>>,
    error_on_commit: Mutex<Option<Error>>,
    // Gate
    commit_started: Notify,
    commit_gate: Mutex<Option<std::sync::Arc<Notify>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock that accepts every commit
    pub fn new() -> Self {
        Self {
            sections: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
            progress_script: Mutex::new(Vec::new()),
            commit_response: Mutex::new(CommitResponse::ok()),
            error_on_refresh: Mutex::new(None),
            error_on_commit: Mutex::new(None),
            commit_started: Notify::new(),
            commit_gate: Mutex::new(None),
        }
    }

    // === Configuration ===

    /// Sections returned by `list_sections`
    pub fn set_sections(&self, sections: Vec<SectionAddress>) {
        *self.sections.lock().unwrap() = sections;
    }

    /// `(sent, total)` pairs reported during `commit`
    pub fn set_progress_script(&self, script: Vec<(u64, u64)>) {
        *self.progress_script.lock().unwrap() = script;
    }

    /// Response body returned by `commit`
    pub fn set_commit_response(&self, response: CommitResponse) {
        *self.commit_response.lock().unwrap() = response;
    }

    /// Hold `commit` open until the returned handle is notified
    pub fn gate_commit(&self) -> std::sync::Arc<Notify> {
        let gate = std::sync::Arc::new(Notify::new());
        *self.commit_gate.lock().unwrap() = Some(std::sync::Arc::clone(&gate));
        gate
    }

    /// Resolves once `commit` has been entered
    pub async fn commit_started(&self) {
        self.commit_started.notified().await;
    }

    // === Error injection ===

    /// Make `refresh_auth` fail
    pub fn fail_refresh(&self, error: Error) {
        *self.error_on_refresh.lock().unwrap() = Some(error);
    }

    /// Make `commit` fail
    pub fn fail_commit(&self, error: Error) {
        *self.error_on_commit.lock().unwrap() = Some(error);
    }

    // === Call verification ===

    /// Every call made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `commit` calls
    pub fn commit_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Commit).count()
    }

    /// Payloads passed to `commit`
    pub fn payloads(&self) -> Vec<SubmissionPayload> {
        self.payloads.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BackendService for MockBackend {
    async fn list_sections(&self) -> Result<Vec<SectionAddress>> {
        self.record(Call::ListSections);
        Ok(self.sections.lock().unwrap().clone())
    }

    async fn refresh_auth(&self) -> Result<()> {
        self.record(Call::RefreshAuth);
        match self.error_on_refresh.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn commit(
        &self,
        payload: &SubmissionPayload,
        progress: UploadProgress,
    ) -> Result<CommitResponse> {
        self.record(Call::Commit);
        self.payloads.lock().unwrap().push(payload.clone());
        self.commit_started.notify_one();

        let gate = self.commit_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let script = self.progress_script.lock().unwrap().clone();
        for (sent, total) in script {
            progress(sent, total);
            tokio::task::yield_now().await;
        }

        if let Some(e) = self.error_on_commit.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.commit_response.lock().unwrap().clone())
    }

    async fn sync(&self) -> Result<()> {
        self.record(Call::Sync);
        Ok(())
    }

    async fn snap(&self, request: &SnapRequest) -> Result<()> {
        self.record(Call::Snap(request.clone()));
        Ok(())
    }
}
