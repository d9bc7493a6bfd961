//! lightwatch: restart an AWS Lightsail instance when its status check
//! fails.
//!
//! Meant to be run periodically (cron, systemd timer):
//!
//! ```text
//! lightwatch run --instance web-1
//! lightwatch check --instance web-1 --format json
//! lightwatch restart --instance web-1 --max-polls 20 --poll-interval 5s
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use lightwatch_core::{LightwatchConfig, parse_duration};
use lightwatch_health::{LightsailMonitor, RetryBudget};

mod aws;
mod logging;
mod report;

use aws::AwsCliClient;
use report::{OutputFormat, Report};

#[derive(Parser)]
#[command(
    name = "lightwatch",
    about = "Restart an AWS Lightsail instance when its status check fails",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to a lightwatch.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file ("-" for stderr). Defaults to ~/check-<instance>.log.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the instance and restart it if its status check is failing.
    Run {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        polls: PollArgs,
    },
    /// Only report whether the instance status check is failing.
    Check {
        #[command(flatten)]
        target: Target,
    },
    /// Restart the instance unconditionally.
    Restart {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        polls: PollArgs,
    },
}

#[derive(Args)]
struct Target {
    /// Name of the Lightsail instance.
    #[arg(long)]
    instance: String,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Default)]
struct PollArgs {
    /// Maximum number of polls while waiting for the instance to stop.
    #[arg(long)]
    max_polls: Option<u32>,

    /// Delay between polls, e.g. "3s" or "500ms".
    #[arg(long, value_parser = parse_interval)]
    poll_interval: Option<Duration>,
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{s}' (expected e.g. 3s, 500ms, 2m)"))
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Run { .. } => "run",
            Command::Check { .. } => "check",
            Command::Restart { .. } => "restart",
        }
    }

    fn target(&self) -> &Target {
        match self {
            Command::Run { target, .. }
            | Command::Check { target }
            | Command::Restart { target, .. } => target,
        }
    }
}

/// Flags override the config file, which overrides the defaults.
fn retry_budget(polls: &PollArgs, config: &LightwatchConfig) -> anyhow::Result<RetryBudget> {
    let max_polls = polls.max_polls.unwrap_or_else(|| config.max_polls());
    let poll_interval = match polls.poll_interval {
        Some(interval) => interval,
        None => config.poll_interval()?,
    };
    Ok(RetryBudget::new(max_polls, poll_interval))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LightwatchConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => LightwatchConfig::default(),
    };

    let target = cli.command.target();
    let log_target = logging::resolve_target(cli.log_file.as_deref(), &config, &target.instance);
    logging::init(&log_target, &config)?;

    let budget = match &cli.command {
        Command::Run { polls, .. } | Command::Restart { polls, .. } => retry_budget(polls, &config)?,
        Command::Check { .. } => retry_budget(&PollArgs::default(), &config)?,
    };

    // Ctrl-C while waiting for the instance to stop abandons the restart
    // without starting the instance.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let monitor = LightsailMonitor::new(AwsCliClient::from_config(&config.aws))
        .with_budget(budget)
        .with_shutdown(shutdown_rx);

    let instance = target.instance.as_str();
    info!(
        %instance,
        command = cli.command.name(),
        max_polls = budget.max_polls,
        poll_interval = ?budget.poll_interval,
        "lightwatch starting"
    );

    let result = match &cli.command {
        Command::Run { .. } => monitor.restart_if_failing(instance).await,
        Command::Check { .. } => monitor.check_instance(instance).await,
        Command::Restart { .. } => monitor.restart_instance(instance).await,
    };

    let report = Report::new(instance, cli.command.name(), &result);
    println!("{}", report.render(target.format)?);
    Ok(report.exit_code())
}
