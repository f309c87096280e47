// src/exec/build.rs

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::{BuildOutcome, RuntimeEvent};
use crate::mapper::BuildInvocation;

/// A build the runtime wants executed.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub invocation: BuildInvocation,
}

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<BuildRequest>` is what the runtime uses as
/// `exec_tx`. Requests are consumed one at a time; the scheduler never has
/// more than one in flight anyway, so the loop shape matches the contract.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<BuildRequest> {
    let (tx, mut rx) = mpsc::channel::<BuildRequest>(32);

    tokio::spawn(async move {
        info!("build executor started");

        while let Some(request) = rx.recv().await {
            let outcome = execute(&request.invocation).await;
            if runtime_tx
                .send(RuntimeEvent::BuildCompleted { outcome })
                .await
                .is_err()
            {
                warn!("runtime channel closed; stopping executor");
                return;
            }
        }

        info!("build executor finished (channel closed)");
    });

    tx
}

/// Run one build invocation to completion.
///
/// Never fails: spawn or wait errors are folded into an outcome with exit
/// code -1, so a broken build tool cannot take down the scheduler.
pub async fn execute(invocation: &BuildInvocation) -> BuildOutcome {
    info!("$ {}", invocation.command_line);

    match run_process(&invocation.command_line).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(error = %err, "build process error");
            BuildOutcome {
                exit_code: -1,
                output: format!("{err:#}"),
            }
        }
    }
}

async fn run_process(command_line: &str) -> Result<BuildOutcome> {
    let mut cmd = shell_command(command_line);
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning build process {command_line:?}"))?;

    // Merge stdout and stderr into one captured transcript. Both streams
    // are drained concurrently so pipe buffers can't fill up.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    capture_lines(child.stdout.take(), line_tx.clone());
    capture_lines(child.stderr.take(), line_tx);

    let mut output = String::new();
    while let Some(line) = line_rx.recv().await {
        debug!("build: {}", line);
        output.push_str(&line);
        output.push('\n');
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for build process {command_line:?}"))?;

    let exit_code = status.code().unwrap_or(-1);
    info!(
        exit_code,
        success = status.success(),
        "build process exited"
    );

    Ok(BuildOutcome { exit_code, output })
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    }
}

fn capture_lines<R>(stream: Option<R>, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(stream) = stream else {
        return;
    };

    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                return;
            }
        }
    });
}
