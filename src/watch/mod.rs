// src/watch/mod.rs

//! File watching and the thread bridge into the runtime.
//!
//! This module wires up a cross-platform filesystem watcher (`notify`) over
//! the configured roots and forwards create/modify events as root-relative
//! path strings into the runtime's event channel. notify callbacks run on
//! watcher threads; they never touch scheduling state directly.
//!
//! It knows nothing about coalescing, ignore suffixes, or build scoping;
//! it only turns filesystem changes into `RuntimeEvent::PathChanged`.

pub mod watcher;

pub use watcher::{spawn_watcher, WatcherHandle};
