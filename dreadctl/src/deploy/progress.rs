//! Progress indicator scoped to a poll loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::models::deployment::{DeploymentHandle, DeploymentRequest};

/// Receives progress while a deployment is being polled
pub trait ProgressReporter: Send + Sync + 'static {
    /// Called once the deployment was accepted, before polling starts
    fn started(&self, _request: &DeploymentRequest, _handle: &DeploymentHandle) {}

    /// Called every indicator interval while polling
    fn tick(&self);
}

/// Background task ticking a reporter while a "still polling" flag is set.
///
/// `stop` clears the flag and joins the task. Dropping without `stop`
/// aborts the task.
pub struct ProgressIndicator {
    polling: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressIndicator {
    /// Spawn the indicator
    pub fn start<F>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (polling, mut rx) = watch::channel(true);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            // first tick completes immediately
            ticker.tick().await;

            loop {
                if !*rx.borrow_and_update() {
                    return;
                }
                tokio::select! {
                    biased;
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    _ = ticker.tick() => on_tick(),
                }
            }
        });

        Self {
            polling,
            handle: Some(handle),
        }
    }

    /// Spawn the indicator for a reporter
    pub fn for_reporter(interval: Duration, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self::start(interval, move || reporter.tick())
    }

    /// Clear the flag and wait for the task to exit
    pub async fn stop(mut self) {
        let _ = self.polling.send(false);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Progress indicator ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.polling.send(false);
            handle.abort();
        }
    }
}
