//! Deployment models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of leading characters compared in [`RevisionMatch::Short`] mode
pub const SHORT_REVISION_LEN: usize = 7;

/// How a desired revision is compared against the deployed one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionMatch {
    /// Exact string equality
    #[default]
    Full,

    /// First 7 characters of both revisions
    Short,
}

impl RevisionMatch {
    /// Whether `desired` counts as already deployed when `deployed` is live
    pub fn matches(&self, desired: &str, deployed: &str) -> bool {
        match self {
            RevisionMatch::Full => desired == deployed,
            RevisionMatch::Short => short_revision(desired) == short_revision(deployed),
        }
    }
}

fn short_revision(revision: &str) -> &str {
    match revision.char_indices().nth(SHORT_REVISION_LEN) {
        Some((end, _)) => &revision[..end],
        None => revision,
    }
}

impl std::str::FromStr for RevisionMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(RevisionMatch::Full),
            "short" => Ok(RevisionMatch::Short),
            _ => Err(format!("Invalid revision match mode: {}", s)),
        }
    }
}

/// Opaque deploy id returned by the service on submission
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentHandle(String);

impl DeploymentHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single deployment to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub stack: String,
    pub region: String,
    pub revision: String,
}

/// Result of submitting a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Service started a deployment
    Accepted { handle: DeploymentHandle },

    /// Service refused with one of its error markers
    Rejected { marker: String },
}

/// Status of a deployment, derived fresh on every poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub handle: DeploymentHandle,
    pub running: bool,
    pub finished: bool,
    pub success: bool,
}

impl DeploymentStatus {
    pub fn new(handle: DeploymentHandle, finished: bool, success: bool) -> Self {
        Self {
            handle,
            running: !finished,
            finished,
            success,
        }
    }
}
