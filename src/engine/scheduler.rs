// src/engine/scheduler.rs

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::engine::pending::PendingChanges;
use crate::mapper::{BuildInvocation, CommandMapper};

/// Whether a build is currently in flight.
///
/// A new build may only start when the state is `Idle`. The "dispatching"
/// step (drain + map) is synchronous inside this state machine, so it never
/// shows up as an observable state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Running,
}

/// A build the scheduler wants the executor to run now.
///
/// `changed` is the drained batch the invocation was derived from; it is
/// carried for logging and inspection, the command line is already final.
#[derive(Debug, Clone)]
pub struct BuildDispatch {
    pub invocation: BuildInvocation,
    pub changed: BTreeSet<String>,
}

/// Single-flight build scheduler.
///
/// Owns the pending-change set and the in-flight state. Changes recorded
/// while a build runs are retained and picked up by the re-evaluation that
/// follows every completion, so no change is ever dropped.
#[derive(Debug)]
pub struct BuildScheduler {
    state: BuildState,
    pending: PendingChanges,
    mapper: CommandMapper,
}

impl BuildScheduler {
    pub fn new(mapper: CommandMapper, pending: PendingChanges) -> Self {
        Self {
            state: BuildState::Idle,
            pending,
            mapper,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == BuildState::Idle
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Record a changed path and, if idle, dispatch a build for it.
    ///
    /// Returns `Some` when the caller must now execute the dispatched
    /// invocation; the scheduler is then `Running` until
    /// [`build_completed`](Self::build_completed) is called.
    pub fn record_change(&mut self, path: &str) -> Option<BuildDispatch> {
        if !self.pending.add(path) {
            return None;
        }

        match self.state {
            BuildState::Idle => self.dispatch(),
            BuildState::Running => {
                debug!(
                    path = %path,
                    pending = self.pending.len(),
                    "build in flight; change retained for next cycle"
                );
                None
            }
        }
    }

    /// Mark the in-flight build as finished and immediately re-evaluate.
    ///
    /// Changes that arrived during the run are drained into the returned
    /// dispatch; `None` means the pending set was empty and the scheduler
    /// has quiesced to `Idle`.
    pub fn build_completed(&mut self) -> Option<BuildDispatch> {
        self.state = BuildState::Idle;
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<BuildDispatch> {
        let changed = self.pending.drain();
        if changed.is_empty() {
            return None;
        }

        let invocation = self.mapper.map(&changed);
        self.state = BuildState::Running;

        info!(
            files = changed.len(),
            scope = ?invocation.scope,
            "dispatching build"
        );

        Some(BuildDispatch {
            invocation,
            changed,
        })
    }
}
