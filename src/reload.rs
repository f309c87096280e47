// src/reload.rs

//! Reload notification boundary.
//!
//! The runtime calls [`ReloadNotifier::notify_reload`] exactly once after
//! each build attempt, success or failure. Implementations must be
//! non-blocking or bounded in time so they can never stall the scheduling
//! loop; failures are logged and never surface back into the scheduler.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::model::ReloadSection;
use crate::exec::build::shell_command;

/// Zero-argument reload signal delivered after each build attempt.
pub trait ReloadNotifier: Send {
    fn notify_reload(&self);
}

/// Default notifier when no transport is configured: just logs.
pub struct LogReloadNotifier;

impl ReloadNotifier for LogReloadNotifier {
    fn notify_reload(&self) {
        info!("reload signal (no reload command configured)");
    }
}

/// Fires a shell command per reload, fire-and-forget.
///
/// Typical use is poking a livereload endpoint. The command runs in its own
/// task so a slow or broken transport cannot stall the runtime.
pub struct CommandReloadNotifier {
    command: String,
}

impl CommandReloadNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl ReloadNotifier for CommandReloadNotifier {
    fn notify_reload(&self) {
        let command = self.command.clone();
        tokio::spawn(async move {
            match shell_command(&command).status().await {
                Ok(status) if status.success() => {
                    debug!(cmd = %command, "reload command succeeded");
                }
                Ok(status) => {
                    warn!(
                        cmd = %command,
                        exit_code = status.code().unwrap_or(-1),
                        "reload command failed"
                    );
                }
                Err(err) => {
                    warn!(cmd = %command, error = %err, "failed to spawn reload command");
                }
            }
        });
    }
}

/// Sends a unit message per reload; used for in-process listeners and tests.
pub struct ChannelReloadNotifier {
    tx: mpsc::UnboundedSender<()>,
}

impl ChannelReloadNotifier {
    pub fn new(tx: mpsc::UnboundedSender<()>) -> Self {
        Self { tx }
    }
}

impl ReloadNotifier for ChannelReloadNotifier {
    fn notify_reload(&self) {
        if self.tx.send(()).is_err() {
            warn!("reload listener dropped; notification lost");
        }
    }
}

/// Pick a notifier implementation from the `[reload]` config section.
pub fn from_config(reload: &ReloadSection) -> Box<dyn ReloadNotifier> {
    match &reload.command {
        Some(command) => Box::new(CommandReloadNotifier::new(command.clone())),
        None => Box::new(LogReloadNotifier),
    }
}
