// src/engine/mod.rs

//! Scheduling engine for sitewatch.
//!
//! This module ties together:
//! - the pending-change coalescer (dedup set + ignore filter)
//! - the single-flight build scheduler state machine
//! - the main runtime event loop that reacts to:
//!   - file-change events from the watcher bridge
//!   - build completion events from the executor
//!   - shutdown signals

pub mod pending;
pub mod runtime;
pub mod scheduler;

pub use pending::{IgnoreList, PendingChanges};
pub use runtime::{BuildOutcome, ChangeKind, Runtime, RuntimeEvent, RuntimeOptions};
pub use scheduler::{BuildDispatch, BuildScheduler, BuildState};
