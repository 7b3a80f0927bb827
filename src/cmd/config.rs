use clap::{Args, Subcommand};

use crate::config::{AppConfig, ConfigUpdate, GithubUpdate, NotificationUpdate};
use crate::error::{AppError, AppResult};
use crate::infra::config_file::JsonConfigStore;
use crate::monitor::Monitor;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the stored configuration and tracking state.
    Show,
    /// Print the path of the configuration file.
    Path,
    /// Change one or more settings.
    Set(SetArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Turn release notifications on or off.
    #[arg(long)]
    pub enabled: Option<bool>,
    /// Play a sound with release notifications.
    #[arg(long)]
    pub sound: Option<bool>,
    /// Minutes between checks.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval: Option<u32>,
    /// Owner of the repository holding the changelog.
    #[arg(long)]
    pub owner: Option<String>,
    /// Repository holding the changelog.
    #[arg(long)]
    pub repo: Option<String>,
    /// Path of the changelog inside the repository.
    #[arg(long)]
    pub path: Option<String>,
}

impl SetArgs {
    fn into_update(self) -> ConfigUpdate {
        let touches_notification =
            self.enabled.is_some() || self.sound.is_some() || self.interval.is_some();
        let notification = touches_notification.then(|| NotificationUpdate {
            enabled: self.enabled,
            sound_enabled: self.sound,
            poll_interval_minutes: self.interval,
        });
        let touches_github = self.owner.is_some() || self.repo.is_some() || self.path.is_some();
        let github = touches_github.then(|| GithubUpdate {
            owner: self.owner,
            repo: self.repo,
            file_path: self.path,
        });
        ConfigUpdate {
            notification,
            github,
            ..ConfigUpdate::default()
        }
    }
}

/// `store` is the file behind `monitor`; it is only used for its path.
pub async fn run(
    command: ConfigCommand,
    monitor: &Monitor,
    store: &JsonConfigStore,
) -> AppResult<()> {
    match command {
        ConfigCommand::Show => run_show(monitor, store).await,
        ConfigCommand::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
        ConfigCommand::Set(args) => run_set(args, monitor, store).await,
    }
}

async fn run_show(monitor: &Monitor, store: &JsonConfigStore) -> AppResult<()> {
    let cfg = monitor.get_config().await?;
    println!("Configuration file: {}", store.path().display());
    print_config(&cfg);
    Ok(())
}

async fn run_set(args: SetArgs, monitor: &Monitor, store: &JsonConfigStore) -> AppResult<()> {
    let update = args.into_update();
    if update.is_empty() {
        return Err(AppError::Configuration(
            "nothing to change; pass at least one setting".to_string(),
        ));
    }
    let cfg = monitor.update_config(update).await?;
    println!("Configuration saved to {}", store.path().display());
    print_config(&cfg);
    Ok(())
}

fn print_config(cfg: &AppConfig) {
    println!("Notifications: {}", on_off(cfg.notification.enabled));
    println!("Sound: {}", on_off(cfg.notification.sound_enabled));
    println!(
        "Check interval: {} minutes",
        cfg.notification.poll_interval_minutes
    );
    println!(
        "Tracked file: {}/{}:{}",
        cfg.github.owner, cfg.github.repo, cfg.github.file_path
    );
    println!(
        "Last known revision: {}",
        display_value(&cfg.last_known_revision_id)
    );
    println!(
        "Last change seen: {}",
        cfg.last_check_timestamp
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "<never>".to_string())
    );
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}
