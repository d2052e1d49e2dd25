//! Deploy and poll over HTTP

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use dreadctl::deploy::executor::{execute, DeployOutcome, ExecuteOptions};
use dreadctl::deploy::progress::ProgressReporter;
use dreadctl::errors::{DeployError, TransportError};
use dreadctl::models::deployment::{DeploymentHandle, DeploymentRequest};

use crate::support::{client_for, MockService};

fn request(revision: &str) -> DeploymentRequest {
    DeploymentRequest {
        stack: "haystack".to_string(),
        region: "all".to_string(),
        revision: revision.to_string(),
    }
}

#[tokio::test]
async fn test_deploy_polls_n_plus_one_times() {
    let (state, client) = client_for(MockService {
        submit_name: Some("42".to_string()),
        running_polls: 3,
        ..Default::default()
    })
    .await;

    let success = client
        .deploy(&request("deadbeef"), None, std::future::pending())
        .await
        .unwrap();

    assert!(success);
    assert_eq!(state.status_calls(), 4);
    assert_eq!(state.submitted_revisions(), vec!["deadbeef".to_string()]);
}

#[tokio::test]
async fn test_deploy_completed_but_failed() {
    let (state, client) = client_for(MockService {
        running_polls: 1,
        success: false,
        ..Default::default()
    })
    .await;

    let success = client
        .deploy(&request("deadbeef"), None, std::future::pending())
        .await
        .unwrap();

    assert!(!success);
    assert_eq!(state.status_calls(), 2);
}

#[tokio::test]
async fn test_stack_locked_is_rejected_without_polling() {
    let (state, client) = client_for(MockService {
        submit_name: Some("StackLockedError".to_string()),
        ..Default::default()
    })
    .await;

    let err = client
        .deploy(&request("deadbeef"), None, std::future::pending())
        .await
        .unwrap_err();

    match err {
        DeployError::DeploymentRejected { marker, .. } => assert_eq!(marker, "StackLockedError"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.status_calls(), 0);
}

#[tokio::test]
async fn test_marker_with_error_status_is_rejected() {
    let (state, client) = client_for(MockService {
        submit_name: Some("NotFoundError".to_string()),
        submit_status: StatusCode::NOT_FOUND,
        ..Default::default()
    })
    .await;

    let err = client
        .deploy(&request("deadbeef"), None, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::DeploymentRejected { .. }));
    assert_eq!(state.status_calls(), 0);
}

#[tokio::test]
async fn test_server_error_on_submit() {
    let (state, client) = client_for(MockService {
        submit_name: None,
        submit_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Default::default()
    })
    .await;

    let err = client
        .deploy(&request("deadbeef"), None, std::future::pending())
        .await
        .unwrap_err();

    match err {
        DeployError::RemoteError {
            target,
            source: TransportError::Status { status, .. },
        } => {
            assert_eq!(status, 500);
            assert_eq!(target.revision.as_deref(), Some("deadbeef"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.submit_calls(), 1);
    assert_eq!(state.status_calls(), 0);
}

#[tokio::test]
async fn test_submit_without_name() {
    let (_state, client) = client_for(MockService {
        submit_name: None,
        ..Default::default()
    })
    .await;

    let err = client
        .deploy(&request("deadbeef"), None, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::RemoteError {
            source: TransportError::MissingField("name"),
            ..
        }
    ));
}

#[tokio::test]
async fn test_poll_status_with_stale_record() {
    let (_state, client) = client_for(MockService {
        status_name: Some("41".to_string()),
        ..Default::default()
    })
    .await;

    let err = client
        .poll_status("haystack", "all", &DeploymentHandle::new("42"))
        .await
        .unwrap_err();

    match err {
        DeployError::InconsistentRemoteState { target, raw } => {
            assert_eq!(target.handle.as_deref(), Some("42"));
            assert!(raw.contains("\"41\""));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let (state, client) = client_for(MockService {
        running_polls: usize::MAX,
        ..Default::default()
    })
    .await;

    let started = Instant::now();
    let err = client
        .deploy(
            &request("deadbeef"),
            None,
            tokio::time::sleep(Duration::from_millis(150)),
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(2));

    let polls = state.status_calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(state.status_calls(), polls);
}

#[tokio::test]
async fn test_latest_already_deployed_is_skipped() {
    let (state, client) = client_for(MockService {
        latest_revision: Some("deadbeef".to_string()),
        deployed_revision: Some("deadbeef".to_string()),
        ..Default::default()
    })
    .await;

    let outcome = execute(
        &client,
        "haystack",
        "all",
        None,
        &ExecuteOptions::default(),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, DeployOutcome::AlreadyDeployed { .. }));
    assert_eq!(state.submit_calls(), 0);
}

#[tokio::test]
async fn test_new_revision_is_deployed() {
    let (state, client) = client_for(MockService {
        deployed_revision: Some("cafebabe".to_string()),
        running_polls: 2,
        ..Default::default()
    })
    .await;

    let outcome = execute(
        &client,
        "haystack",
        "all",
        Some("deadbeef"),
        &ExecuteOptions::default(),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, DeployOutcome::Deployed { .. }));
    assert_eq!(state.submitted_revisions(), vec!["deadbeef".to_string()]);
    assert_eq!(state.status_calls(), 3);
}

#[derive(Default)]
struct TickCounter {
    ticks: AtomicUsize,
}

impl ProgressReporter for TickCounter {
    fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_status_error_aborts_polling() {
    let (state, client) = client_for(MockService {
        submit_name: Some("9".to_string()),
        running_polls: 10,
        failing_poll: Some(3),
        ..Default::default()
    })
    .await;
    let reporter = Arc::new(TickCounter::default());

    let err = client
        .deploy(
            &request("deadbeef"),
            Some(reporter.clone() as Arc<dyn ProgressReporter>),
            std::future::pending(),
        )
        .await
        .unwrap_err();

    match &err {
        DeployError::RemoteError { target, source } => {
            assert_eq!(target.handle.as_deref(), Some("9"));
            assert_eq!(target.region.as_deref(), Some("all"));
            assert!(matches!(source, TransportError::Status { status: 500, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.status_calls(), 3);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(state.status_calls(), 3);
    assert_eq!(Arc::strong_count(&reporter), 1);
}
