//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logs::LogLevel;
use crate::models::deployment::RevisionMatch;

/// Version with git hash and build time
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "dreadctl")]
#[command(about = "Trigger and monitor Dreadnot deployments, primarily from CI")]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    /// Config file with the service endpoint and credentials
    #[arg(short, long, global = true, default_value = "dreadctl.yml")]
    pub config: PathBuf,

    /// Use a named environment from the config file
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Deploy even if the desired revision is already deployed
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Report what would be deployed without deploying
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Revision comparison mode (full or short), overriding the config file
    #[arg(long, global = true)]
    pub revision_match: Option<RevisionMatch>,

    /// Log level, overriding the config file
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Don't print progress dots while waiting on a deployment
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy a revision of haystack
    Haystack {
        /// Revision to deploy (defaults to the latest known revision)
        #[arg(long, visible_alias = "rev")]
        revision: Option<String>,

        /// Region to deploy to
        #[arg(long, default_value = "all")]
        region: String,
    },

    /// Deploy a revision of core for a partner
    Core {
        /// Partner to deploy to
        #[arg(short, long)]
        partner: String,

        /// Revision to deploy (defaults to the latest known revision)
        #[arg(long, visible_alias = "rev")]
        revision: Option<String>,

        /// Region to deploy to (defaults to the partner name)
        #[arg(long)]
        region: Option<String>,
    },

    /// Deploy a revision of a partner's assets
    Assets {
        /// Partner whose assets to deploy
        #[arg(short, long)]
        partner: String,

        /// Revision to deploy (defaults to the latest known revision)
        #[arg(long, visible_alias = "rev")]
        revision: Option<String>,

        /// Region to deploy to (defaults to the partner name)
        #[arg(long)]
        region: Option<String>,
    },

    /// Deploy a revision of any stack
    Deploy {
        #[arg(short, long)]
        stack: String,

        #[arg(short, long)]
        region: String,

        /// Revision to deploy (defaults to the latest known revision)
        #[arg(long, visible_alias = "rev")]
        revision: Option<String>,
    },

    /// Show latest and deployed revisions of a stack
    Status {
        #[arg(short, long)]
        stack: String,

        #[arg(short, long)]
        region: Option<String>,
    },
}

/// Stack, region and optional revision named on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    pub stack: String,
    pub region: String,
    pub revision: Option<String>,
}

impl Command {
    /// The deployment this command asks for; `None` for read-only commands
    pub fn deploy_target(&self) -> Option<DeployTarget> {
        match self {
            Command::Haystack { revision, region } => Some(DeployTarget {
                stack: "haystack".to_string(),
                region: region.clone(),
                revision: revision.clone(),
            }),
            Command::Core {
                partner,
                revision,
                region,
            } => Some(DeployTarget {
                stack: format!("{}_core", partner),
                region: region.clone().unwrap_or_else(|| partner.clone()),
                revision: revision.clone(),
            }),
            Command::Assets {
                partner,
                revision,
                region,
            } => Some(DeployTarget {
                stack: format!("{}_assets", partner),
                region: region.clone().unwrap_or_else(|| partner.clone()),
                revision: revision.clone(),
            }),
            Command::Deploy {
                stack,
                region,
                revision,
            } => Some(DeployTarget {
                stack: stack.clone(),
                region: region.clone(),
                revision: revision.clone(),
            }),
            Command::Status { .. } => None,
        }
    }
}
