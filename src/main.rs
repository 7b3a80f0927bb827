mod changelog;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod monitor;
mod notifier;
mod scheduler;
mod services;
#[cfg(test)]
mod testing;
mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::config::config_file_path;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::config_file::JsonConfigStore;
use crate::infra::github::GitHubClient;
use crate::infra::notifier::{NotifierBackend, select_sink};
use crate::monitor::Monitor;
use crate::notifier::Notifier;
use crate::scheduler::STARTUP_DELAY;
use crate::services::ConfigStore;
use crate::workflow::detect::FirstRunPolicy;

#[derive(Parser)]
#[command(
    name = "changelog-notifier",
    author,
    version,
    about = "Desktop notifications for new releases listed in a GitHub changelog"
)]
struct Cli {
    /// Path of the JSON configuration file.
    #[arg(long, global = true, env = "CHANGELOG_NOTIFIER_CONFIG")]
    config: Option<PathBuf>,

    /// Token for GitHub API requests; anonymous access is rate limited.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Base URL of the GitHub REST API.
    #[arg(long, global = true, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// How notifications are delivered.
    #[arg(long, global = true, value_enum, default_value_t = NotifierBackend::Auto)]
    notifier: NotifierBackend,

    /// Whether the very first check reports the current changelog.
    #[arg(long, global = true, value_enum, default_value_t = FirstRunPolicy::Notify)]
    first_run: FirstRunPolicy,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the changelog and notify about new versions until interrupted.
    Watch,
    /// Check once right now.
    Check,
    /// Print the newest changelog entry without recording anything.
    Latest,
    /// Show a test notification.
    TestNotification,
    /// Manage the stored configuration.
    Config(ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

async fn run(cli: Cli) -> AppResult<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };
    let store = Arc::new(JsonConfigStore::new(config_path));

    // Config edits never show notifications, so they do not need a desktop tool.
    let backend = match cli.command {
        Commands::Config(_) => NotifierBackend::Log,
        _ => cli.notifier,
    };
    let monitor = build_monitor(&cli, store.clone(), backend).await?;
    match cli.command {
        Commands::Watch => cmd::watch::run(&monitor).await,
        Commands::Check => cmd::check::run(&monitor).await,
        Commands::Latest => cmd::check::run_latest(&monitor).await,
        Commands::TestNotification => {
            monitor.test_notification().await?;
            println!("Test notification sent.");
            Ok(())
        }
        Commands::Config(args) => config_cmd::run(args.command, &monitor, &store).await,
    }
}

async fn build_monitor(
    cli: &Cli,
    store: Arc<JsonConfigStore>,
    backend: NotifierBackend,
) -> AppResult<Monitor> {
    let config = store.load().await?;
    debug!(path = %store.path().display(), "configuration loaded");

    if cli.github_token.is_none() {
        debug!("no GitHub token configured; using anonymous, rate-limited access");
    }

    let remote = Arc::new(GitHubClient::new(
        config.github.clone(),
        cli.github_token.clone(),
        cli.api_url.clone(),
    ));
    let sink = select_sink(backend)?;
    let notifier = Arc::new(Notifier::new(sink, config.notification.sound_enabled));
    debug!(
        tracked = %format!(
            "{}/{}:{}",
            config.github.owner, config.github.repo, config.github.file_path
        ),
        notifier = notifier.sink_name(),
        "changelog notifier ready"
    );

    let context = AppContext::new(remote, store, notifier).with_first_run(cli.first_run);
    Ok(Monitor::new(context, STARTUP_DELAY))
}
