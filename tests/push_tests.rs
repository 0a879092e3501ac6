//! Push coordinator tests against the mock backend

mod common;

use async_trait::async_trait;
use bxt_stage::backend::CommitResponse;
use bxt_stage::commit::CommitPatch;
use bxt_stage::error::Error;
use bxt_stage::submit::{NoopProgress, Phase, ProgressCallback, PushCoordinator, PushState};
use common::fixtures::{
    make_add, make_section, make_store_with_upload, make_unsigned_upload, make_upload,
};
use common::mock_backend::{Call, MockBackend};
use std::sync::Mutex;

/// Progress callback that records everything it is told
#[derive(Default)]
struct RecordingProgress {
    phases: Mutex<Vec<Phase>>,
    fractions: Mutex<Vec<f64>>,
    errors: Mutex<Vec<String>>,
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_phase(&self, phase: Phase) {
        self.phases.lock().unwrap().push(phase);
    }

    async fn on_upload_progress(&self, fraction: f64) {
        self.fractions.lock().unwrap().push(fraction);
    }

    async fn on_error(&self, error: &Error) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    async fn on_message(&self, _message: &str) {}
}

#[tokio::test]
async fn test_push_clears_store_on_success() {
    let section = make_section("main/core/x86_64");
    let mut store = bxt_stage::store::CommitStore::new();
    store
        .stage(
            &section,
            CommitPatch::add(make_add([make_upload("foo-1.0.pkg", &section)])),
        )
        .unwrap();

    let backend = MockBackend::new();
    let coordinator = PushCoordinator::new();
    let outcome = coordinator
        .push(&mut store, &backend, &NoopProgress)
        .await
        .unwrap();

    assert!(store.is_empty());
    assert_eq!(outcome.packages, 1);
    assert_eq!(outcome.sections, 1);
    assert!(outcome.reload_sections);
    assert_eq!(coordinator.state(), PushState::Idle);

    let payloads = backend.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(
        payloads[0].field_names(),
        [
            "package1.filepath",
            "package1.signature",
            "package1.section",
            "to_delete",
            "to_copy",
            "to_move",
        ]
    );
    assert_eq!(payloads[0].text("to_delete"), Some("[]"));
    assert_eq!(payloads[0].text("to_copy"), Some("[]"));
    assert_eq!(payloads[0].text("to_move"), Some("[]"));
}

#[tokio::test]
async fn test_refresh_runs_before_commit() {
    let mut store = make_store_with_upload("foo-1.0.pkg");
    let backend = MockBackend::new();

    PushCoordinator::new()
        .push(&mut store, &backend, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(backend.calls(), [Call::RefreshAuth, Call::Commit]);
}

#[tokio::test]
async fn test_missing_signature_makes_no_network_call() {
    let section = make_section("stable/core/x86_64");
    let mut store = bxt_stage::store::CommitStore::new();
    store
        .stage(
            &section,
            CommitPatch::add(make_add([make_unsigned_upload("bar-2.0.pkg", &section)])),
        )
        .unwrap();
    let before = store.clone();

    let backend = MockBackend::new();
    let progress = RecordingProgress::default();
    let coordinator = PushCoordinator::new();
    let err = coordinator
        .push(&mut store, &backend, &progress)
        .await
        .unwrap_err();

    match err {
        Error::MissingFields { package, fields } => {
            assert_eq!(package, "bar-2.0.pkg");
            assert_eq!(fields, ["signature file"]);
        }
        other => panic!("expected MissingFields, got {other:?}"),
    }
    assert!(backend.calls().is_empty());
    assert_eq!(store, before);
    assert_eq!(coordinator.state(), PushState::Idle);
    assert_eq!(progress.errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_refresh_failure_keeps_store() {
    let mut store = make_store_with_upload("foo-1.0.pkg");
    let before = store.clone();

    let backend = MockBackend::new();
    backend.fail_refresh(Error::Unauthorized);
    let coordinator = PushCoordinator::new();

    let err = coordinator
        .push(&mut store, &backend, &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(backend.commit_count(), 0);
    assert_eq!(store, before);
    assert_eq!(coordinator.state(), PushState::Idle);
}

#[tokio::test]
async fn test_rejected_commit_keeps_store() {
    let mut store = make_store_with_upload("foo-1.0.pkg");
    let before = store.clone();

    let backend = MockBackend::new();
    backend.set_commit_response(CommitResponse {
        status: Some("error".to_string()),
        result: None,
    });
    let coordinator = PushCoordinator::new();

    let err = coordinator
        .push(&mut store, &backend, &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Backend(ref msg) if msg.contains("error")));
    assert_eq!(store, before);
    assert_eq!(coordinator.state(), PushState::Idle);
}

#[tokio::test]
async fn test_failed_upload_allows_retry() {
    let mut store = make_store_with_upload("foo-1.0.pkg");
    let backend = MockBackend::new();
    backend.fail_commit(Error::Backend("502 Bad Gateway: upstream".to_string()));
    let coordinator = PushCoordinator::new();

    assert!(
        coordinator
            .push(&mut store, &backend, &NoopProgress)
            .await
            .is_err()
    );
    assert!(!store.is_empty());

    coordinator
        .push(&mut store, &backend, &NoopProgress)
        .await
        .unwrap();
    assert!(store.is_empty());
    assert_eq!(backend.commit_count(), 2);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_phases_ordered() {
    let mut store = make_store_with_upload("foo-1.0.pkg");
    let backend = MockBackend::new();
    backend.set_progress_script(vec![(0, 100), (30, 100), (20, 100), (70, 100), (100, 100)]);
    let progress = RecordingProgress::default();

    PushCoordinator::new()
        .push(&mut store, &backend, &progress)
        .await
        .unwrap();

    let fractions = progress.fractions.lock().unwrap().clone();
    assert_eq!(fractions, [0.3, 0.7, 1.0]);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(
        *progress.phases.lock().unwrap(),
        [
            Phase::Encoding,
            Phase::RefreshingAuth,
            Phase::Uploading,
            Phase::Complete
        ]
    );
}

#[tokio::test]
async fn test_second_push_rejected_while_in_flight() {
    let mut first_store = make_store_with_upload("foo-1.0.pkg");
    let mut second_store = make_store_with_upload("bar-1.0.pkg");
    let second_before = second_store.clone();

    let backend = MockBackend::new();
    let gate = backend.gate_commit();
    backend.set_progress_script(vec![(50, 100), (100, 100)]);
    let coordinator = PushCoordinator::new();
    let other = coordinator.clone();
    let progress = RecordingProgress::default();

    let (first, second) = tokio::join!(
        coordinator.push(&mut first_store, &backend, &progress),
        async {
            backend.commit_started().await;
            assert!(other.is_in_flight());
            let result = other.push(&mut second_store, &backend, &NoopProgress).await;
            gate.notify_one();
            result
        }
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(Error::PushInFlight)));
    assert_eq!(backend.commit_count(), 1);
    assert!(first_store.is_empty());
    assert_eq!(second_store, second_before);
    assert_eq!(*progress.fractions.lock().unwrap(), [0.5, 1.0]);
    assert_eq!(coordinator.state(), PushState::Idle);
}
