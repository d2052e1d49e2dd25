//! Stack and deployment endpoints

use async_trait::async_trait;
use dreadnot_api::{DeploymentRecord, DeploymentRequestBody, RegionInfo, StackInfo, SubmitResponse};
use tracing::{debug, info, warn};

use crate::deploy::api::DeploymentApi;
use crate::errors::{DeployError, Target, TransportError};
use crate::http::client::HttpClient;
use crate::models::deployment::{DeploymentHandle, DeploymentRequest, SubmitOutcome};

#[async_trait]
impl DeploymentApi for HttpClient {
    async fn latest_revision(&self, stack: &str) -> Result<String, DeployError> {
        let target = Target::stack(stack);
        let info: StackInfo = self
            .get(&["stacks", stack])
            .await
            .map_err(|e| DeployError::remote(target.clone(), e))?;

        info.latest_revision
            .ok_or_else(|| DeployError::remote(target, TransportError::MissingField("latest_revision")))
    }

    async fn deployed_revision(&self, stack: &str, region: &str) -> Result<String, DeployError> {
        let target = Target::region(stack, region);
        let info: RegionInfo = self
            .get(&["stacks", stack, "regions", region])
            .await
            .map_err(|e| DeployError::remote(target.clone(), e))?;

        info.deployed_revision
            .ok_or_else(|| DeployError::remote(target, TransportError::MissingField("deployed_revision")))
    }

    async fn submit_deployment(
        &self,
        request: &DeploymentRequest,
    ) -> Result<SubmitOutcome, DeployError> {
        let target = Target::region(&request.stack, &request.region).with_revision(&request.revision);
        let body = DeploymentRequestBody {
            to_revision: request.revision.clone(),
        };

        let result: Result<SubmitResponse, TransportError> = self
            .post_form(
                &[
                    "stacks",
                    request.stack.as_str(),
                    "regions",
                    request.region.as_str(),
                    "deployments",
                ],
                &body,
            )
            .await;

        let response = match result {
            Ok(response) => response,
            // Error markers may also arrive with a non-success status
            Err(TransportError::Status { status, body }) => {
                match serde_json::from_str::<SubmitResponse>(&body) {
                    Ok(response) if response.error_marker().is_some() => response,
                    _ => {
                        return Err(DeployError::remote(
                            target,
                            TransportError::Status { status, body },
                        ))
                    }
                }
            }
            Err(e) => return Err(DeployError::remote(target, e)),
        };

        if let Some(marker) = response.error_marker() {
            warn!("Deployment of {} rejected: {}", target, marker);
            return Ok(SubmitOutcome::Rejected {
                marker: marker.to_string(),
            });
        }

        match response.name {
            Some(name) => {
                info!("Submitted deployment of {} as deploy {}", target, name);
                Ok(SubmitOutcome::Accepted {
                    handle: DeploymentHandle::new(name),
                })
            }
            None => Err(DeployError::remote(target, TransportError::MissingField("name"))),
        }
    }

    async fn deployment_record(
        &self,
        stack: &str,
        region: &str,
        handle: &DeploymentHandle,
    ) -> Result<DeploymentRecord, DeployError> {
        let record: DeploymentRecord = self
            .get(&["stacks", stack, "regions", region, "deployments", handle.as_str()])
            .await
            .map_err(|e| {
                DeployError::remote(Target::region(stack, region).with_handle(handle.as_str()), e)
            })?;

        debug!(
            "Deploy {} of {}: finished={:?} success={:?}",
            handle, stack, record.finished, record.success
        );
        Ok(record)
    }
}
