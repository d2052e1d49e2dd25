//! Command dispatch against a mock service

use std::sync::Arc;

use clap::Parser;
use dreadctl::app::args::Cli;
use dreadctl::app::run::{run, Exit};
use dreadctl::config::settings::Settings;
use dreadctl::errors::DeployError;
use dreadctl::filesys::file::File;

use crate::support::{start, MockService};

async fn settings_for(api: &str) -> (tempfile::TempDir, Settings) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dreadctl.yml");
    std::fs::write(
        &path,
        format!(
            "config:\n  username: jenkins\n  password: secret\n  api: {api}\n\
             environments:\n  broken:\n    username: jenkins\n    password: secret\n    api: \"\"\n\
             poll_interval_secs: 1\n"
        ),
    )
    .unwrap();
    let settings = Settings::load(&File::new(&path)).await.unwrap();
    (dir, settings)
}

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("dreadctl").chain(args.iter().copied())).unwrap()
}

#[tokio::test]
async fn test_run_deploys_haystack() {
    let state = Arc::new(MockService {
        deployed_revision: Some("cafebabe".to_string()),
        ..Default::default()
    });
    let api = start(state.clone()).await;
    let (_dir, settings) = settings_for(&api).await;

    let exit = run(
        &cli(&["haystack", "--revision", "deadbeef", "--no-progress"]),
        &settings,
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(exit, Exit::Success);
    assert_eq!(state.submitted_revisions(), vec!["deadbeef".to_string()]);
}

#[tokio::test]
async fn test_run_dry_run_core() {
    let state = Arc::new(MockService {
        deployed_revision: Some("cafebabe".to_string()),
        ..Default::default()
    });
    let api = start(state.clone()).await;
    let (_dir, settings) = settings_for(&api).await;

    let exit = run(
        &cli(&["core", "--partner", "acme", "--revision", "deadbeef", "-n"]),
        &settings,
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(exit, Exit::Success);
    assert_eq!(state.submit_calls(), 0);
}

#[tokio::test]
async fn test_run_rejected_is_error() {
    let state = Arc::new(MockService {
        deployed_revision: Some("cafebabe".to_string()),
        submit_name: Some("DreadnotError".to_string()),
        ..Default::default()
    });
    let api = start(state.clone()).await;
    let (_dir, settings) = settings_for(&api).await;

    let err = run(
        &cli(&["assets", "--partner", "acme", "--revision", "deadbeef"]),
        &settings,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error deploying acme_assets in region acme @ deadbeef: DreadnotError"
    );
}

#[tokio::test]
async fn test_run_unknown_environment() {
    let state = Arc::new(MockService::default());
    let api = start(state).await;
    let (_dir, settings) = settings_for(&api).await;

    let err = run(
        &cli(&["haystack", "--env", "prod"]),
        &settings,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeployError::ConfigError(_)));
}

#[tokio::test]
async fn test_run_invalid_endpoint() {
    let state = Arc::new(MockService::default());
    let api = start(state).await;
    let (_dir, settings) = settings_for(&api).await;

    let err = run(
        &cli(&["haystack", "--env", "broken"]),
        &settings,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("Invalid endpoint"));
}
