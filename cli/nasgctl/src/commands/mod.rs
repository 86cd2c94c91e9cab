//! CLI commands.

mod check;
mod groups;
mod peers;
mod run;
mod scale;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nasg_autoscaling::{AwsScalingClient, ScalingApi, DEFAULT_PROFILE, DEFAULT_REGION};
use nasg_nginx::NginxClient;
use nasg_smoke::args::{AWS_PROFILE_ENV, AWS_REGION_ENV, NGINX_API_ENV};
use nasg_smoke::scenario::{load_scenarios, select};
use nasg_smoke::{default_scenarios, CliArguments, Scenario, SmokeRunner, SmokeSettings};

use crate::output::OutputFormat;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// nasg-smoke - check that NGINX Plus upstreams follow Auto Scaling groups.
#[derive(Debug, Parser)]
#[command(name = "nasg-smoke")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// NGINX Plus API url, e.g. http://lb.example.com:8080/api.
    #[arg(long, global = true, env = NGINX_API_ENV, default_value = "")]
    nginx_api: String,

    /// AWS region of the Auto Scaling groups.
    #[arg(long, global = true, env = AWS_REGION_ENV, default_value = DEFAULT_REGION)]
    aws_region: String,

    /// AWS shared-config profile.
    #[arg(long, global = true, env = AWS_PROFILE_ENV, default_value = DEFAULT_PROFILE)]
    aws_profile: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log format; the level comes from RUST_LOG.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the scenario matrix: scale every group up, then down.
    Run(run::RunCommand),

    /// Set the desired capacity of one group.
    Scale(scale::ScaleCommand),

    /// Show the peers of an upstream.
    Peers(peers::PeersCommand),

    /// List Auto Scaling groups with their instance states.
    Groups(groups::GroupsCommand),

    /// Check the API, groups and upstreams without scaling anything.
    Check(check::CheckCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let ctx = CommandContext {
            nginx_api: self.nginx_api,
            aws_region: self.aws_region,
            aws_profile: self.aws_profile,
            format: self.format,
            settings: SmokeSettings::from_env(),
        };

        match self.command {
            Commands::Run(cmd) => cmd.run(ctx).await,
            Commands::Scale(cmd) => cmd.run(ctx).await,
            Commands::Peers(cmd) => cmd.run(ctx).await,
            Commands::Groups(cmd) => cmd.run(ctx).await,
            Commands::Check(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("nasg-smoke {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Scenario selection shared by `run` and `check`.
#[derive(Debug, Args)]
pub struct ScenarioArgs {
    /// YAML file listing scenarios; defaults to the three reference backends.
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Only run these scenario ids.
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,
}

impl ScenarioArgs {
    pub fn load(&self) -> Result<Vec<Scenario>> {
        let scenarios = match &self.scenarios {
            Some(path) => load_scenarios(path)?,
            None => default_scenarios(),
        };
        Ok(select(scenarios, &self.only)?)
    }
}

/// Shared command context.
pub struct CommandContext {
    pub nginx_api: String,
    pub aws_region: String,
    pub aws_profile: String,
    pub format: OutputFormat,
    pub settings: SmokeSettings,
}

impl CommandContext {
    /// Validated run-wide arguments.
    pub fn arguments(&self) -> Result<CliArguments> {
        Ok(CliArguments::new(
            &self.nginx_api,
            &self.aws_region,
            &self.aws_profile,
        )?)
    }

    /// NGINX Plus client for the configured API url.
    pub fn nginx(&self) -> Result<NginxClient> {
        let args = self.arguments()?;
        NginxClient::new(
            &args.nginx_api,
            self.settings.nginx_api_version,
            self.settings.http_timeout,
        )
        .context("Failed to create the NGINX Plus client")
    }

    /// Auto Scaling client for the configured region and profile.
    pub async fn scaling(&self) -> Arc<dyn ScalingApi> {
        Arc::new(AwsScalingClient::connect(&self.aws_region, &self.aws_profile).await)
    }

    /// Runner wired to both clients.
    pub async fn runner(&self) -> Result<SmokeRunner> {
        let nginx = self.nginx()?;
        let scaling = self.scaling().await;
        Ok(SmokeRunner::new(scaling, nginx, self.settings.clone()))
    }
}
