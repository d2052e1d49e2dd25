//! Console output

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

use crate::config::settings::EndpointSettings;
use crate::deploy::executor::DeployOutcome;
use crate::deploy::progress::ProgressReporter;
use crate::errors::DeployError;
use crate::models::deployment::{DeploymentHandle, DeploymentRequest};

/// Prints a deploy line and one dot per tick to stderr
#[derive(Default)]
pub struct ConsoleProgress {
    started: AtomicBool,
}

impl ConsoleProgress {
    /// End the dots line, if one was started
    pub fn finish(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            eprintln!();
        }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn started(&self, request: &DeploymentRequest, handle: &DeploymentHandle) {
        self.started.store(true, Ordering::SeqCst);
        eprint!(
            "Deploying {} in region {} @ {} as deploy {}.",
            request.stack, request.region, request.revision, handle
        );
        let _ = std::io::stderr().flush();
    }

    fn tick(&self) {
        eprint!(".");
        let _ = std::io::stderr().flush();
    }
}

/// One-line summary of an outcome
pub fn describe(outcome: &DeployOutcome) -> String {
    match outcome {
        DeployOutcome::AlreadyDeployed { request } => format!(
            "{} revision {} is already deployed in region {}, skipping",
            request.stack, request.revision, request.region
        ),
        DeployOutcome::WouldDeploy { request, deployed } => format!(
            "would deploy {} in region {}: {} -> {}",
            request.stack,
            request.region,
            deployed.as_deref().unwrap_or("(nothing deployed)"),
            request.revision
        ),
        DeployOutcome::Deployed { request } => format!(
            "deployed {} in region {} @ {}: success!",
            request.stack, request.region, request.revision
        ),
        DeployOutcome::Failed { request } => format!(
            "deploying {} in region {} @ {} failed!",
            request.stack, request.region, request.revision
        ),
    }
}

/// Print an outcome to stdout
pub fn print_outcome(outcome: &DeployOutcome) {
    let line = describe(outcome);
    match outcome {
        DeployOutcome::Deployed { .. } => println!("{}", line.green()),
        DeployOutcome::Failed { .. } => println!("{}", line.red()),
        _ => println!("{}", line),
    }
}

/// Ask for the password of an endpoint on the terminal
pub fn prompt_password(endpoint: &EndpointSettings) -> Result<String, DeployError> {
    dialoguer::Password::new()
        .with_prompt(format!("Password for {} at {}", endpoint.username, endpoint.api))
        .interact()
        .map_err(|e| DeployError::ConfigError(format!("Unable to read password: {}", e)))
}
