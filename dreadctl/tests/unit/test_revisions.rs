//! Revision lookups over HTTP

use dreadctl::errors::{DeployError, TransportError};
use tokio_test::assert_ok;

use crate::support::{client_for, MockService};

#[tokio::test]
async fn test_latest_and_deployed_revision() {
    let (state, client) = client_for(MockService {
        latest_revision: Some("deadbeef".to_string()),
        deployed_revision: Some("cafebabe".to_string()),
        ..Default::default()
    })
    .await;

    let latest = assert_ok!(client.get_latest_revision("haystack").await);
    assert_eq!(latest, "deadbeef");

    let deployed = assert_ok!(client.get_deployed_revision("haystack", "all").await);
    assert_eq!(deployed, "cafebabe");

    assert_eq!(
        state.authorization().as_deref(),
        Some("Basic amVua2luczpzZWNyZXQ=")
    );
}

#[tokio::test]
async fn test_missing_latest_revision() {
    let (_state, client) = client_for(MockService::default()).await;

    let err = client.get_latest_revision("haystack").await.unwrap_err();

    match err {
        DeployError::RemoteError { target, source } => {
            assert_eq!(target.stack, "haystack");
            assert!(matches!(source, TransportError::MissingField("latest_revision")));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_non_json_response() {
    let (_state, client) = client_for(MockService {
        malformed_stack: true,
        ..Default::default()
    })
    .await;

    let err = client.get_latest_revision("haystack").await.unwrap_err();

    match err {
        DeployError::RemoteError {
            source: TransportError::Malformed { body, .. },
            ..
        } => assert!(body.contains("maintenance")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_service() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let api = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = dreadctl::deploy::client::DeploymentClient::connect(
        crate::support::credentials(&api),
        &Default::default(),
        crate::support::poll_options(20),
    )
    .unwrap();

    let err = client.get_deployed_revision("haystack", "all").await.unwrap_err();
    assert!(matches!(
        err,
        DeployError::RemoteError {
            source: TransportError::Http(_),
            ..
        }
    ));
    assert!(err.to_string().contains("haystack in region all"));
}
