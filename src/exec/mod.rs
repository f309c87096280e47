// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs build invocations through the platform shell using
//! `tokio::process::Command` and reports completion back to the runtime via
//! `RuntimeEvent`s. The executor takes no locks; "only one build at a time"
//! is the scheduler's responsibility.

pub mod build;

pub use build::{execute, spawn_executor, BuildRequest};
