//! Command dispatch

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use tracing::{debug, info};

use crate::app::args::{Cli, Command, DeployTarget};
use crate::app::output::{print_outcome, prompt_password, ConsoleProgress};
use crate::config::settings::Settings;
use crate::deploy::api::DeploymentApi;
use crate::deploy::client::DeploymentClient;
use crate::deploy::executor::{execute, ExecuteOptions};
use crate::deploy::progress::ProgressReporter;
use crate::errors::DeployError;

/// How a dreadctl invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Deployed, skipped, dry run or status printed
    Success,

    /// The deployment ran and failed
    Failure,

    /// Interrupted while waiting on a deployment
    Cancelled,
}

impl Exit {
    pub fn code(&self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::Failure => 1,
            Exit::Cancelled => 130,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Run a command against the configured deployment service
pub async fn run<S>(cli: &Cli, settings: &Settings, shutdown: S) -> Result<Exit, DeployError>
where
    S: Future<Output = ()> + Send,
{
    let endpoint = settings.endpoint(cli.env.as_deref())?;
    debug!("Using endpoint {} as {}", endpoint.api, endpoint.username);

    let credentials = endpoint.credentials(prompt_password)?;
    let client = DeploymentClient::connect(
        credentials,
        &settings.client_options(),
        settings.poll_options(),
    )?;

    run_with_client(cli, settings, &client, shutdown).await
}

/// Run a command with an existing client
pub async fn run_with_client<A, S>(
    cli: &Cli,
    settings: &Settings,
    client: &DeploymentClient<A>,
    shutdown: S,
) -> Result<Exit, DeployError>
where
    A: DeploymentApi,
    S: Future<Output = ()> + Send,
{
    if let Command::Status { stack, region } = &cli.command {
        return status(client, stack, region.as_deref()).await;
    }

    match cli.command.deploy_target() {
        Some(target) => deploy(cli, settings, client, target, shutdown).await,
        None => Ok(Exit::Success),
    }
}

async fn deploy<A, S>(
    cli: &Cli,
    settings: &Settings,
    client: &DeploymentClient<A>,
    target: DeployTarget,
    shutdown: S,
) -> Result<Exit, DeployError>
where
    A: DeploymentApi,
    S: Future<Output = ()> + Send,
{
    let revision_match = cli
        .revision_match
        .unwrap_or_else(|| settings.revision_match(&target.stack));

    let progress = (!cli.no_progress).then(|| Arc::new(ConsoleProgress::default()));
    let options = ExecuteOptions {
        force: cli.force,
        dry_run: cli.dry_run,
        revision_match,
        progress: progress
            .clone()
            .map(|progress| progress as Arc<dyn ProgressReporter>),
    };

    info!(
        "Deploying {} to region {} (revision {}, force={}, dry_run={})",
        target.stack,
        target.region,
        target.revision.as_deref().unwrap_or("latest"),
        options.force,
        options.dry_run
    );

    let result = execute(
        client,
        &target.stack,
        &target.region,
        target.revision.as_deref(),
        &options,
        shutdown,
    )
    .await;

    if let Some(progress) = &progress {
        progress.finish();
    }

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            if outcome.is_failure() {
                Ok(Exit::Failure)
            } else {
                Ok(Exit::Success)
            }
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("{}", e.to_string().yellow());
            Ok(Exit::Cancelled)
        }
        Err(e) => Err(e),
    }
}

async fn status<A: DeploymentApi>(
    client: &DeploymentClient<A>,
    stack: &str,
    region: Option<&str>,
) -> Result<Exit, DeployError> {
    let latest = client.get_latest_revision(stack).await?;
    println!("{} latest revision: {}", stack, latest);

    if let Some(region) = region {
        let deployed = client.get_deployed_revision(stack, region).await?;
        println!("{} deployed in region {}: {}", stack, region, deployed);
    }

    Ok(Exit::Success)
}
