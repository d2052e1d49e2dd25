//! Error types for dreadctl

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// What a remote call was about: stack, region and revision or deploy id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub stack: String,
    pub region: Option<String>,
    pub revision: Option<String>,
    pub handle: Option<String>,
}

impl Target {
    pub fn stack(stack: &str) -> Self {
        Self {
            stack: stack.to_string(),
            ..Default::default()
        }
    }

    pub fn region(stack: &str, region: &str) -> Self {
        Self {
            stack: stack.to_string(),
            region: Some(region.to_string()),
            ..Default::default()
        }
    }

    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = Some(revision.to_string());
        self
    }

    pub fn with_handle(mut self, handle: &str) -> Self {
        self.handle = Some(handle.to_string());
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stack)?;
        if let Some(region) = &self.region {
            write!(f, " in region {}", region)?;
        }
        if let Some(revision) = &self.revision {
            write!(f, " @ {}", revision)?;
        }
        if let Some(handle) = &self.handle {
            write!(f, " (deploy {})", handle)?;
        }
        Ok(())
    }
}

/// Failures of the HTTP transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {reason}: {body}")]
    Malformed { reason: String, body: String },

    #[error("Response is missing field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid URL: {0}")]
    Url(String),
}

/// Why a poll loop was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Aborted,
    TimedOut(Duration),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Aborted => write!(f, "aborted"),
            CancelReason::TimedOut(after) => write!(f, "timed out after {:?}", after),
        }
    }
}

/// Main error type for dreadctl
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Remote error for {target}: {source}")]
    RemoteError {
        target: Target,
        #[source]
        source: TransportError,
    },

    #[error("Error deploying {target}: {marker}")]
    DeploymentRejected { target: Target, marker: String },

    #[error("Inconsistent remote state for {target}: {raw}")]
    InconsistentRemoteState { target: Target, raw: String },

    #[error("Deployment of {target} {reason}")]
    Cancelled { target: Target, reason: CancelReason },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DeployError {
    pub fn remote(target: Target, source: impl Into<TransportError>) -> Self {
        DeployError::RemoteError {
            target,
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeployError::Cancelled { .. })
    }

    /// Fill in the region of the error's target if it has none
    pub fn in_region(mut self, region: &str) -> Self {
        match &mut self {
            DeployError::RemoteError { target, .. }
            | DeployError::DeploymentRejected { target, .. }
            | DeployError::InconsistentRemoteState { target, .. }
            | DeployError::Cancelled { target, .. } => {
                target.region.get_or_insert_with(|| region.to_string());
            }
            _ => {}
        }
        self
    }
}
