// src/engine/runtime.rs

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::scheduler::{BuildDispatch, BuildScheduler};
use crate::exec::BuildRequest;
use crate::reload::ReloadNotifier;

/// What kind of filesystem change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
}

/// Result of one build attempt.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub exit_code: i32,
    /// Captured stdout with stderr merged in, line by line.
    pub output: String,
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Events sent into the runtime from the watcher bridge, the executor, or
/// external signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    PathChanged {
        /// Path relative to the project root, forward slashes.
        path: String,
        kind: ChangeKind,
    },
    BuildCompleted {
        outcome: BuildOutcome,
    },
    ShutdownRequested,
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// If true, exit as soon as a build completes with nothing pending.
    /// In watch mode this should be `false`.
    pub exit_when_idle: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            exit_when_idle: false,
        }
    }
}

/// The main scheduling runtime.
///
/// This task owns all mutable scheduling state ([`BuildScheduler`] and its
/// pending set); everything else crosses in through the event channel.
///
/// Responsibilities:
/// - Consume `RuntimeEvent`s from the watcher bridge / executor / ctrl-c.
/// - Drive the single-flight scheduler.
/// - Send dispatched builds to the executor.
/// - Fire the reload notifier exactly once per completed build attempt,
///   success or failure, before re-evaluating pending changes.
pub struct Runtime {
    scheduler: BuildScheduler,
    options: RuntimeOptions,

    /// Unified event stream from all producers.
    events_rx: mpsc::Receiver<RuntimeEvent>,

    /// Channel to the executor; at most one request is in flight at a time,
    /// guaranteed by the scheduler state machine.
    exec_tx: mpsc::Sender<BuildRequest>,

    notifier: Box<dyn ReloadNotifier>,
}

impl Runtime {
    pub fn new(
        scheduler: BuildScheduler,
        options: RuntimeOptions,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        exec_tx: mpsc::Sender<BuildRequest>,
        notifier: Box<dyn ReloadNotifier>,
    ) -> Self {
        Self {
            scheduler,
            options,
            events_rx,
            exec_tx,
            notifier,
        }
    }

    /// Main event loop.
    pub async fn run(mut self) -> Result<()> {
        info!("sitewatch runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            let keep_running = match event {
                RuntimeEvent::PathChanged { path, kind } => {
                    self.handle_path_changed(path, kind).await?
                }
                RuntimeEvent::BuildCompleted { outcome } => {
                    self.handle_build_completed(outcome).await?
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping runtime");
                    false
                }
            };

            if !keep_running {
                break;
            }
        }

        info!("sitewatch runtime exiting");
        Ok(())
    }

    async fn handle_path_changed(&mut self, path: String, kind: ChangeKind) -> Result<bool> {
        // The coalescer logs "file changed" / "ignoring change" once the
        // ignore filter has decided; only the raw event is traced here.
        debug!(path = %path, ?kind, "change event from watcher");

        if let Some(dispatch) = self.scheduler.record_change(&path) {
            self.send_to_executor(dispatch).await?;
        }

        Ok(true)
    }

    async fn handle_build_completed(&mut self, outcome: BuildOutcome) -> Result<bool> {
        if outcome.success() {
            info!(exit_code = outcome.exit_code, "build completed");
        } else {
            // A broken build is terminal to this cycle only; the reload
            // below still fires so the user sees the error state.
            warn!(exit_code = outcome.exit_code, "build failed");
            error!("build output:\n{}", outcome.output);
        }

        self.notifier.notify_reload();

        if let Some(dispatch) = self.scheduler.build_completed() {
            self.send_to_executor(dispatch).await?;
        } else if self.options.exit_when_idle {
            info!("runtime idle and exit_when_idle=true, stopping");
            return Ok(false);
        }

        Ok(true)
    }

    async fn send_to_executor(&mut self, dispatch: BuildDispatch) -> Result<()> {
        debug!(changed = ?dispatch.changed, "sending build to executor");
        self.exec_tx
            .send(BuildRequest {
                invocation: dispatch.invocation,
            })
            .await
            .context("sending build request to executor")
    }
}
