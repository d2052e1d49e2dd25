//! Decide whether to deploy, then deploy

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::deploy::api::DeploymentApi;
use crate::deploy::client::DeploymentClient;
use crate::deploy::progress::ProgressReporter;
use crate::errors::{DeployError, TransportError};
use crate::models::deployment::{DeploymentRequest, RevisionMatch};

/// Caller-level switches for one deployment
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Deploy even if the desired revision is already live
    pub force: bool,

    /// Only read and compare; never submit
    pub dry_run: bool,

    /// How desired and deployed revisions are compared
    pub revision_match: RevisionMatch,

    /// Progress reporter for the poll loop
    pub progress: Option<Arc<dyn ProgressReporter>>,
}

/// What `execute` ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The desired revision is already live
    AlreadyDeployed { request: DeploymentRequest },

    /// Dry run: a deployment would have been submitted
    WouldDeploy {
        request: DeploymentRequest,
        deployed: Option<String>,
    },

    /// Deployment ran and succeeded
    Deployed { request: DeploymentRequest },

    /// Deployment ran and failed
    Failed { request: DeploymentRequest },
}

impl DeployOutcome {
    pub fn request(&self) -> &DeploymentRequest {
        match self {
            DeployOutcome::AlreadyDeployed { request }
            | DeployOutcome::WouldDeploy { request, .. }
            | DeployOutcome::Deployed { request }
            | DeployOutcome::Failed { request } => request,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DeployOutcome::Failed { .. })
    }
}

/// Deploy `revision` (or the latest revision) of `stack` to `region`
/// unless it is already deployed.
pub async fn execute<A, C>(
    client: &DeploymentClient<A>,
    stack: &str,
    region: &str,
    revision: Option<&str>,
    options: &ExecuteOptions,
    cancel: C,
) -> Result<DeployOutcome, DeployError>
where
    A: DeploymentApi,
    C: Future<Output = ()> + Send,
{
    let revision = match revision {
        Some(revision) => revision.to_string(),
        None => {
            let latest = client
                .get_latest_revision(stack)
                .await
                .map_err(|e| e.in_region(region))?;
            info!("Using latest revision {} of {}", latest, stack);
            latest
        }
    };

    let request = DeploymentRequest {
        stack: stack.to_string(),
        region: region.to_string(),
        revision,
    };

    let deployed = deployed_revision(client, stack, region).await?;
    debug!(
        "{} in region {}: deployed {:?}, desired {}",
        stack, region, deployed, request.revision
    );

    let up_to_date = deployed
        .as_deref()
        .is_some_and(|deployed| options.revision_match.matches(&request.revision, deployed));

    if up_to_date && !options.force {
        info!(
            "{} revision {} is already deployed in region {}",
            stack, request.revision, region
        );
        return Ok(DeployOutcome::AlreadyDeployed { request });
    }

    if options.dry_run {
        return Ok(DeployOutcome::WouldDeploy { request, deployed });
    }

    let success = client
        .deploy(&request, options.progress.clone(), cancel)
        .await?;

    if success {
        Ok(DeployOutcome::Deployed { request })
    } else {
        Ok(DeployOutcome::Failed { request })
    }
}

/// The deployed revision, or `None` for a region that has never been deployed
async fn deployed_revision<A: DeploymentApi>(
    client: &DeploymentClient<A>,
    stack: &str,
    region: &str,
) -> Result<Option<String>, DeployError> {
    match client.get_deployed_revision(stack, region).await {
        Ok(revision) => Ok(Some(revision)),
        Err(DeployError::RemoteError {
            source: TransportError::MissingField("deployed_revision"),
            ..
        }) => Ok(None),
        Err(e) => Err(e),
    }
}
