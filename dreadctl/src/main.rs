//! dreadctl - Entry Point
//!
//! Deploys stacks through the Dreadnot API, primarily from CI jobs.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dreadctl::app::args::Cli;
use dreadctl::app::run::{run, Exit};
use dreadctl::config::settings::Settings;
use dreadctl::filesys::file::File;
use dreadctl::logs::{init_logging, LogOptions};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match try_main(cli).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            Exit::Failure.into()
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<Exit> {
    let config_file = File::new(&cli.config);
    let settings = Settings::load(&config_file)
        .await
        .with_context(|| format!("Unable to load config file {}", cli.config.display()))?;

    // Initialize logging
    let log_options = LogOptions {
        log_level: cli.log_level.or(settings.log_level).unwrap_or_default(),
        json_format: cli.log_json,
    };
    if let Err(e) = init_logging(&log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = settings.check_permissions(&config_file).await {
        warn!("Unable to check permissions of {}: {}", cli.config.display(), e);
    }

    let exit = run(&cli, &settings, await_shutdown_signal()).await?;
    info!("Finished with {:?}", exit);
    Ok(exit)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                await_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, abandoning deployment...");
            }
            _ = await_ctrl_c() => {}
        }
    }

    #[cfg(not(unix))]
    {
        await_ctrl_c().await;
    }
}

async fn await_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received, abandoning deployment..."),
        Err(e) => {
            warn!("Unable to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
