//! API models

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Error markers the service returns in `name` instead of a deploy id
pub const ERROR_MARKERS: [&str; 3] = ["DreadnotError", "NotFoundError", "StackLockedError"];

/// Stack info (`GET /stacks/{stack}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latest_revision: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Region info (`GET /stacks/{stack}/regions/{region}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub deployed_revision: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Deployment request body (`POST /stacks/{stack}/regions/{region}/deployments`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequestBody {
    pub to_revision: String,
}

/// Response to a deployment submission.
///
/// `name` is either the new deploy id or one of [`ERROR_MARKERS`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SubmitResponse {
    /// The error marker carried in `name`, if any
    pub fn error_marker(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| ERROR_MARKERS.contains(name))
    }
}

/// Deployment record (`GET /stacks/{stack}/regions/{region}/deployments/{id}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: Option<String>,
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub from_revision: Option<String>,
    #[serde(default)]
    pub to_revision: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DeploymentRecord {
    /// Raw JSON form of the record, for diagnostics
    pub fn raw(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Deploy ids are strings, but older services send them as numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => number_id(&n)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an integer id, got {}", n))),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn number_id(n: &serde_json::Number) -> Option<String> {
    if let Some(id) = n.as_u64() {
        return Some(id.to_string());
    }
    if let Some(id) = n.as_i64() {
        return Some(id.to_string());
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
        .map(|f| format!("{}", f as i64))
}
