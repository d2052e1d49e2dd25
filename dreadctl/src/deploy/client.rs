//! Deployment client: submit, poll, report

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::deploy::api::DeploymentApi;
use crate::deploy::progress::{ProgressIndicator, ProgressReporter};
use crate::errors::{CancelReason, DeployError, Target};
use crate::http::client::{ClientOptions, Credentials, HttpClient};
use crate::models::deployment::{
    DeploymentHandle, DeploymentRequest, DeploymentStatus, SubmitOutcome,
};

/// Poll loop options
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between status polls
    pub interval: Duration,

    /// Give up on the poll loop after this long
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: None,
        }
    }
}

/// Client for the deployment service.
///
/// One deployment is in flight per `deploy` call. Submissions are never
/// retried: resubmitting can start a duplicate deployment, so any retry is
/// up to the caller.
pub struct DeploymentClient<A = HttpClient> {
    api: A,
    options: PollOptions,
}

impl DeploymentClient<HttpClient> {
    /// Build a client talking HTTP to the service at `credentials.api`
    pub fn connect(
        credentials: Credentials,
        client_options: &ClientOptions,
        options: PollOptions,
    ) -> Result<Self, DeployError> {
        let api = credentials.api.clone();
        let http = HttpClient::new(credentials, client_options)
            .map_err(|e| DeployError::ConfigError(format!("Invalid endpoint {}: {}", api, e)))?;
        debug!("Using deployment service at {}", http.base_url());
        Ok(Self::new(http, options))
    }
}

impl<A: DeploymentApi> DeploymentClient<A> {
    pub fn new(api: A, options: PollOptions) -> Self {
        Self { api, options }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Latest revision known for a stack
    pub async fn get_latest_revision(&self, stack: &str) -> Result<String, DeployError> {
        self.api.latest_revision(stack).await
    }

    /// Revision currently deployed in a stack/region
    pub async fn get_deployed_revision(
        &self,
        stack: &str,
        region: &str,
    ) -> Result<String, DeployError> {
        self.api.deployed_revision(stack, region).await
    }

    /// Fetch the status of a deployment.
    ///
    /// Fails with `InconsistentRemoteState` when the service answers with a
    /// record for some other deploy id.
    pub async fn poll_status(
        &self,
        stack: &str,
        region: &str,
        handle: &DeploymentHandle,
    ) -> Result<DeploymentStatus, DeployError> {
        let record = self.api.deployment_record(stack, region, handle).await?;

        if record.name.as_deref() != Some(handle.as_str()) {
            return Err(DeployError::InconsistentRemoteState {
                target: Target::region(stack, region).with_handle(handle.as_str()),
                raw: record.raw(),
            });
        }

        Ok(DeploymentStatus::new(
            handle.clone(),
            record.finished.unwrap_or(false),
            record.success.unwrap_or(false),
        ))
    }

    /// Submit a deployment and poll it until it finishes.
    ///
    /// Returns the service's success flag: `Ok(false)` is a deployment that
    /// ran and failed. Resolving `cancel` or hitting the configured timeout
    /// abandons the poll loop with `Cancelled`; the remote deployment keeps
    /// running.
    pub async fn deploy<C>(
        &self,
        request: &DeploymentRequest,
        progress: Option<Arc<dyn ProgressReporter>>,
        cancel: C,
    ) -> Result<bool, DeployError>
    where
        C: Future<Output = ()> + Send,
    {
        let target =
            Target::region(&request.stack, &request.region).with_revision(&request.revision);

        let handle = match self.api.submit_deployment(request).await? {
            SubmitOutcome::Rejected { marker } => {
                return Err(DeployError::DeploymentRejected { target, marker });
            }
            SubmitOutcome::Accepted { handle } => handle,
        };
        info!("Deploying {} as deploy {}", target, handle);

        let indicator = progress.map(|reporter| {
            reporter.started(request, &handle);
            ProgressIndicator::for_reporter(self.options.interval, reporter)
        });

        let result = self.await_completion(request, &handle, cancel).await;

        if let Some(indicator) = indicator {
            indicator.stop().await;
        }

        match &result {
            Ok(true) => info!("Deploy {} of {} succeeded", handle, target),
            Ok(false) => warn!("Deploy {} of {} failed", handle, target),
            Err(e) => warn!("Deploy {} of {} did not complete: {}", handle, target, e),
        }
        result
    }

    async fn await_completion<C>(
        &self,
        request: &DeploymentRequest,
        handle: &DeploymentHandle,
        cancel: C,
    ) -> Result<bool, DeployError>
    where
        C: Future<Output = ()> + Send,
    {
        let timeout = async {
            match self.options.timeout {
                Some(after) => {
                    tokio::time::sleep(after).await;
                    CancelReason::TimedOut(after)
                }
                None => std::future::pending().await,
            }
        };

        let cancelled = |reason: CancelReason| DeployError::Cancelled {
            target: Target::region(&request.stack, &request.region)
                .with_revision(&request.revision)
                .with_handle(handle.as_str()),
            reason,
        };

        tokio::select! {
            result = self.poll_until_finished(&request.stack, &request.region, handle) => result,
            _ = cancel => Err(cancelled(CancelReason::Aborted)),
            reason = timeout => Err(cancelled(reason)),
        }
    }

    async fn poll_until_finished(
        &self,
        stack: &str,
        region: &str,
        handle: &DeploymentHandle,
    ) -> Result<bool, DeployError> {
        loop {
            let status = self.poll_status(stack, region, handle).await?;
            if status.finished {
                return Ok(status.success);
            }
            debug!("Deploy {} still running", handle);
            tokio::time::sleep(self.options.interval).await;
        }
    }
}
