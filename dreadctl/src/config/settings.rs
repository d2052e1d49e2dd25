//! Settings file management

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::warn;

use crate::deploy::client::PollOptions;
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::http::client::{ClientOptions, Credentials};
use crate::logs::LogLevel;
use crate::models::deployment::RevisionMatch;

/// dreadctl settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Default deployment service endpoint
    #[serde(default)]
    pub config: Option<EndpointSettings>,

    /// Named alternative endpoints, selected with `--env`
    #[serde(default)]
    pub environments: BTreeMap<String, EndpointSettings>,

    /// Per-stack settings
    #[serde(default)]
    pub stacks: BTreeMap<String, StackSettings>,

    /// Delay between status polls in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up waiting on a deployment after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Per-request HTTP timeout in seconds; unset means no timeout
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

fn default_poll_interval() -> u64 {
    2
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config: None,
            environments: BTreeMap::new(),
            stacks: BTreeMap::new(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: None,
            request_timeout_secs: None,
            log_level: None,
        }
    }
}

impl Settings {
    /// Load and validate a settings file
    pub async fn load(file: &File) -> Result<Self, DeployError> {
        if !file.exists().await {
            return Err(DeployError::ConfigError(format!(
                "Config file {} not found",
                file.path().display()
            )));
        }

        let settings: Settings = file.read_yaml().await?;
        settings.validate()?;
        Ok(settings)
    }

    /// Warn when `file` holds passwords and is readable by others
    pub async fn check_permissions(&self, file: &File) -> Result<(), DeployError> {
        if self.has_passwords() && !file.is_private().await? {
            warn!(
                "Config file {} contains passwords and is readable by others",
                file.path().display()
            );
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.poll_interval_secs == 0 {
            return Err(DeployError::ConfigError(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(DeployError::ConfigError(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn has_passwords(&self) -> bool {
        self.config
            .iter()
            .chain(self.environments.values())
            .any(|endpoint| endpoint.password.is_some())
    }

    /// Endpoint for the selected environment, or the default one
    pub fn endpoint(&self, env: Option<&str>) -> Result<&EndpointSettings, DeployError> {
        match env {
            Some(name) => self.environments.get(name).ok_or_else(|| {
                let known: Vec<&str> = self.environments.keys().map(String::as_str).collect();
                DeployError::ConfigError(format!(
                    "Unknown environment '{}' (known: {})",
                    name,
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                ))
            }),
            None => self.config.as_ref().ok_or_else(|| {
                DeployError::ConfigError(
                    "No `config` section; add one or select an environment with --env".to_string(),
                )
            }),
        }
    }

    /// Revision comparison mode for a stack
    pub fn revision_match(&self, stack: &str) -> RevisionMatch {
        self.stacks
            .get(stack)
            .map(|s| s.revision_match)
            .unwrap_or_default()
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Deployment service endpoint and credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointSettings {
    pub username: String,

    /// Prompted for when absent
    #[serde(default)]
    pub password: Option<String>,

    /// Base URL of the deployment service
    pub api: String,
}

impl EndpointSettings {
    /// Build credentials, asking `prompt` for a password if none is configured
    pub fn credentials<P>(&self, prompt: P) -> Result<Credentials, DeployError>
    where
        P: FnOnce(&EndpointSettings) -> Result<String, DeployError>,
    {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt(self)?,
        };

        Ok(Credentials {
            username: self.username.clone(),
            password: SecretString::from(password),
            api: self.api.clone(),
        })
    }
}

/// Per-stack settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackSettings {
    #[serde(default)]
    pub revision_match: RevisionMatch,
}
