// src/engine/pending.rs

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};

/// Compiled ignore filter built from configured filename suffixes.
///
/// Each suffix (e.g. `".bak"`) becomes a `*{suffix}` glob, so the filter
/// matches anywhere in the watched tree.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    set: Option<GlobSet>,
}

impl IgnoreList {
    /// An ignore list that drops nothing.
    pub fn empty() -> Self {
        Self { set: None }
    }

    pub fn from_suffixes(suffixes: &[String]) -> Result<Self> {
        if suffixes.is_empty() {
            return Ok(Self::empty());
        }

        let mut builder = GlobSetBuilder::new();
        for suffix in suffixes {
            let pattern = format!("*{suffix}");
            let glob = Glob::new(&pattern)
                .with_context(|| format!("compiling ignore pattern {pattern:?}"))?;
            builder.add(glob);
        }
        let set = builder.build().context("building ignore glob set")?;

        Ok(Self { set: Some(set) })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.set.as_ref().is_some_and(|set| set.is_match(path))
    }
}

/// Pending changed paths awaiting the next build dispatch.
///
/// Semantics:
/// - Paths are deduplicated; adding the same path N times before a drain
///   yields exactly one occurrence in that drain.
/// - `drain` atomically returns and clears the whole set, so a path added
///   after the snapshot is visible to the *next* drain.
/// - Only the runtime task touches this, so no lock is needed; events that
///   arrive while a build runs simply enlarge the set.
#[derive(Debug)]
pub struct PendingChanges {
    ignore: IgnoreList,
    paths: BTreeSet<String>,
}

impl PendingChanges {
    pub fn new(ignore: IgnoreList) -> Self {
        Self {
            ignore,
            paths: BTreeSet::new(),
        }
    }

    /// Record a changed path, applying the ignore filter first.
    ///
    /// Ignored paths are logged and dropped before any "file changed" line
    /// is emitted. Returns `false` if the path was dropped by the filter.
    pub fn add(&mut self, path: &str) -> bool {
        if self.ignore.matches(path) {
            info!(path = %path, "ignoring change (matches ignore suffix)");
            return false;
        }

        info!(path = %path, "file changed");
        let inserted = self.paths.insert(path.to_string());
        debug!(path = %path, inserted, "recorded pending change");
        true
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Return and clear the current pending set.
    pub fn drain(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.paths)
    }
}
