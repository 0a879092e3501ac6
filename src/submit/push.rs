//! Push coordination
//!
//! Encodes the staging area, refreshes the session, uploads the commit and
//! clears the store once the server accepts it. At most one push runs at a
//! time; the store is left untouched on every failure path.

use crate::backend::{BackendService, UploadProgress};
use crate::error::{Error, Result};
use crate::store::CommitStore;
use crate::submit::{Phase, ProgressCallback, encode};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Observable state of the coordinator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushState {
    /// No push running
    Idle,
    /// Upload running, `progress` in `0.0..=1.0`
    InFlight {
        /// Fraction of package bytes sent
        progress: f64,
    },
}

/// Result of a successful push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Number of sections that were submitted
    pub sections: usize,
    /// Number of uploaded packages
    pub packages: usize,
    /// Caller should re-fetch the section listing
    pub reload_sections: bool,
}

/// Runs pushes one at a time
#[derive(Debug, Clone)]
pub struct PushCoordinator {
    state: Arc<Mutex<PushState>>,
}

impl Default for PushCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the coordinator to `Idle` when dropped
struct InFlightGuard {
    state: Arc<Mutex<PushState>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        *lock(&self.state) = PushState::Idle;
    }
}

fn lock(state: &Mutex<PushState>) -> MutexGuard<'_, PushState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PushCoordinator {
    /// Create an idle coordinator
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PushState::Idle)),
        }
    }

    /// Current state
    pub fn state(&self) -> PushState {
        *lock(&self.state)
    }

    /// Whether a push is running
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state(), PushState::InFlight { .. })
    }

    fn begin(&self) -> Result<InFlightGuard> {
        let mut state = lock(&self.state);
        if matches!(*state, PushState::InFlight { .. }) {
            return Err(Error::PushInFlight);
        }
        *state = PushState::InFlight { progress: 0.0 };
        Ok(InFlightGuard {
            state: Arc::clone(&self.state),
        })
    }

    /// Sink that records progress and forwards increases to `tx`
    #[allow(clippy::cast_precision_loss)]
    fn progress_sink(&self, tx: mpsc::UnboundedSender<f64>) -> UploadProgress {
        let state = Arc::clone(&self.state);
        Arc::new(move |sent, total| {
            let fraction = if total == 0 {
                1.0
            } else {
                (sent as f64 / total as f64).clamp(0.0, 1.0)
            };

            let mut state = lock(&state);
            if let PushState::InFlight { progress } = &mut *state {
                if fraction > *progress {
                    *progress = fraction;
                    let _ = tx.send(fraction);
                }
            }
        })
    }

    /// Push every staged commit
    ///
    /// 1. Encode the store; missing fields abort before any network call
    /// 2. Refresh the session
    /// 3. Upload, reporting progress
    /// 4. On `{"status": "ok"}` clear the store
    ///
    /// Any failure leaves `store` as it was so the push can be retried.
    pub async fn push(
        &self,
        store: &mut CommitStore,
        backend: &dyn BackendService,
        progress: &dyn ProgressCallback,
    ) -> Result<PushOutcome> {
        if self.is_in_flight() {
            return Err(Error::PushInFlight);
        }

        progress.on_phase(Phase::Encoding).await;
        let payload = match encode(store) {
            Ok(payload) => payload,
            Err(e) => {
                progress.on_error(&e).await;
                return Err(e);
            }
        };

        let _guard = self.begin()?;
        let sections = store.len();
        let summary = format!(
            "Pushing {} packages across {sections} sections",
            payload.package_count
        );
        info!("{summary}");
        progress.on_message(&summary).await;

        progress.on_phase(Phase::RefreshingAuth).await;
        if let Err(e) = backend.refresh_auth().await {
            warn!("Session refresh failed: {e}");
            progress.on_error(&e).await;
            return Err(e);
        }

        progress.on_phase(Phase::Uploading).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let upload = backend.commit(&payload, self.progress_sink(tx));
        tokio::pin!(upload);

        let response = loop {
            tokio::select! {
                biased;
                Some(fraction) = rx.recv() => progress.on_upload_progress(fraction).await,
                response = &mut upload => break response,
            }
        };
        while let Ok(fraction) = rx.try_recv() {
            progress.on_upload_progress(fraction).await;
        }

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Commit upload failed: {e}");
                progress.on_error(&e).await;
                return Err(e);
            }
        };

        if !response.is_ok() {
            let e = Error::Backend(format!("commit rejected: {}", response.describe()));
            progress.on_error(&e).await;
            return Err(e);
        }

        store.clear_commits();
        debug!("Store cleared after successful push");
        progress.on_phase(Phase::Complete).await;

        Ok(PushOutcome {
            sections,
            packages: payload.package_count,
            reload_sections: true,
        })
    }
}
