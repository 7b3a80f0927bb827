use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::services::{Notification, NotificationSink};

const APP_NAME: &str = "changelog-notifier";
const TERMINAL_NOTIFIER: &str = "terminal-notifier";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifierBackend {
    /// Pick the best backend available on this machine.
    Auto,
    /// The platform notification center (notify-send / osascript).
    Native,
    /// The external terminal-notifier CLI.
    TerminalNotifier,
    /// Only write notifications to the log.
    Log,
}

/// Desktop notifications through the tool each platform ships with.
pub struct NativeNotifier {
    program: PathBuf,
}

impl NativeNotifier {
    pub fn detect() -> Option<Self> {
        let program = if cfg!(target_os = "macos") {
            "osascript"
        } else if cfg!(unix) {
            "notify-send"
        } else {
            return None;
        };
        find_in_path(program).map(|program| Self { program })
    }

    fn args(&self, notification: &Notification) -> Vec<String> {
        if cfg!(target_os = "macos") {
            let mut script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_applescript(&notification.body),
                escape_applescript(&notification.title)
            );
            if notification.sound {
                script.push_str(" sound name \"default\"");
            }
            vec!["-e".to_string(), script]
        } else {
            vec![
                "--app-name".to_string(),
                APP_NAME.to_string(),
                "--urgency".to_string(),
                "normal".to_string(),
                notification.title.clone(),
                notification.body.clone(),
            ]
        }
    }
}

#[async_trait]
impl NotificationSink for NativeNotifier {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn show(&self, notification: &Notification) -> AppResult<()> {
        run_notifier(&self.program, self.args(notification)).await
    }
}

/// Notifications through the `terminal-notifier` CLI, which can play a sound
/// and open the changelog when clicked.
pub struct CommandNotifier {
    program: PathBuf,
}

impl CommandNotifier {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    pub fn detect() -> Option<Self> {
        find_in_path(TERMINAL_NOTIFIER).map(Self::new)
    }

    fn args(&self, notification: &Notification) -> Vec<String> {
        let mut args = vec![
            "-title".to_string(),
            notification.title.clone(),
            "-message".to_string(),
            notification.body.clone(),
            "-group".to_string(),
            APP_NAME.to_string(),
        ];
        if notification.sound {
            args.push("-sound".to_string());
            args.push("default".to_string());
        }
        if let Some(url) = &notification.action_url {
            args.push("-open".to_string());
            args.push(url.clone());
        }
        args
    }
}

#[async_trait]
impl NotificationSink for CommandNotifier {
    fn name(&self) -> &'static str {
        TERMINAL_NOTIFIER
    }

    async fn show(&self, notification: &Notification) -> AppResult<()> {
        run_notifier(&self.program, self.args(notification)).await
    }
}

/// Writes notifications to the log instead of the desktop.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn show(&self, notification: &Notification) -> AppResult<()> {
        info!(
            title = %notification.title,
            sound = notification.sound,
            actionable = notification.is_actionable(),
            action = notification.action_url.as_deref().unwrap_or("-"),
            "notification\n{}",
            notification.body
        );
        Ok(())
    }
}

/// Resolves the requested backend once at startup.
pub fn select_sink(backend: NotifierBackend) -> AppResult<Arc<dyn NotificationSink>> {
    let sink: Arc<dyn NotificationSink> = match backend {
        NotifierBackend::Log => Arc::new(LogNotifier),
        NotifierBackend::Native => Arc::new(NativeNotifier::detect().ok_or_else(|| {
            AppError::Notification("no native notification tool found on PATH".to_string())
        })?),
        NotifierBackend::TerminalNotifier => {
            Arc::new(CommandNotifier::detect().ok_or_else(|| {
                AppError::Notification(format!("{TERMINAL_NOTIFIER} not found on PATH"))
            })?)
        }
        NotifierBackend::Auto => auto_sink(),
    };
    debug!(sink = sink.name(), "notification backend selected");
    Ok(sink)
}

fn auto_sink() -> Arc<dyn NotificationSink> {
    // terminal-notifier supports click actions, so it wins on macOS.
    if cfg!(target_os = "macos") {
        if let Some(notifier) = CommandNotifier::detect() {
            return Arc::new(notifier);
        }
    }
    if let Some(notifier) = NativeNotifier::detect() {
        return Arc::new(notifier);
    }
    if let Some(notifier) = CommandNotifier::detect() {
        return Arc::new(notifier);
    }
    warn!("no desktop notification tool found, falling back to log output");
    Arc::new(LogNotifier)
}

async fn run_notifier(program: &Path, args: Vec<String>) -> AppResult<()> {
    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| {
            AppError::Notification(format!("failed to run {}: {err}", program.display()))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Notification(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
