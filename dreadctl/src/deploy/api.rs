//! Deployment service API seam

use async_trait::async_trait;
use dreadnot_api::DeploymentRecord;

use crate::errors::DeployError;
use crate::models::deployment::{DeploymentHandle, DeploymentRequest, SubmitOutcome};

/// Remote calls against the deployment service, one per endpoint.
///
/// Implementations attach the stack/region/revision to every error they
/// return and never retry.
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Latest revision known for a stack
    async fn latest_revision(&self, stack: &str) -> Result<String, DeployError>;

    /// Revision currently live in a stack/region
    async fn deployed_revision(&self, stack: &str, region: &str) -> Result<String, DeployError>;

    /// Start a deployment
    async fn submit_deployment(
        &self,
        request: &DeploymentRequest,
    ) -> Result<SubmitOutcome, DeployError>;

    /// Fetch the record of a deployment
    async fn deployment_record(
        &self,
        stack: &str,
        region: &str,
        handle: &DeploymentHandle,
    ) -> Result<DeploymentRecord, DeployError>;
}
