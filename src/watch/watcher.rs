// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::model::WatchEntry;
use crate::engine::{ChangeKind, RuntimeEvent};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher over the configured entries and forward
/// create/modify events into the runtime.
///
/// - `root` is the project root; changed paths are relativized against it
///   before crossing into the runtime.
/// - `entries` are the watched roots (directories or single files), each
///   with its own recursive flag.
/// - `runtime_tx` is the channel into the main runtime.
///
/// notify invokes its callback on watcher threads. The callback only pushes
/// the raw event into an unbounded channel, so it never blocks and never
/// mutates scheduling state; an async task drains that channel and performs
/// filtering and relativization before sending `PathChanged` events.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    entries: &[WatchEntry],
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        // We can't log via tracing here easily, so fallback to stderr.
                        eprintln!("sitewatch: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("sitewatch: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    for entry in entries {
        let path = root.join(&entry.path);
        let mode = if entry.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&path, mode)
            .with_context(|| format!("watching {path:?}"))?;
        info!(path = ?path, recursive = entry.recursive, "watching");
    }

    // Async task that consumes notify events and forwards path changes to
    // the runtime.
    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("received notify event: {:?}", event);

            let Some(kind) = change_kind(&event.kind) else {
                continue;
            };

            for path in &event.paths {
                // Directory modification events are just churn from entries
                // inside them; the entries produce their own events.
                if path.is_dir() {
                    continue;
                }

                let rel = relative_str(&async_root, path);
                if let Err(err) = runtime_tx
                    .send(RuntimeEvent::PathChanged { path: rel, kind })
                    .await
                {
                    warn!("failed to send RuntimeEvent::PathChanged: {err}");
                    // If the runtime channel is closed, there's no point
                    // keeping the watcher loop alive.
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => None,
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Paths outside `root` are passed through whole; the mapper classifies
/// them as out-of-root and they still trigger a full rebuild rather than
/// being dropped.
fn relative_str(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
