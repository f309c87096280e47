// src/mapper.rs

//! Mapping from a batch of changed paths to one build invocation.
//!
//! The mapper is a pure function over the drained change set: the same set
//! always yields the same invocation. Precision is sacrificed for
//! correctness when batching; anything ambiguous falls back to a full
//! rebuild rather than failing.

use std::collections::BTreeSet;

use crate::config::model::{BuildSection, RewriteRule};
use crate::config::validate::GLOB_PLACEHOLDER;

/// How much of the output the build tool should regenerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Rebuild only outputs matching this glob (relative to the source root).
    Glob(String),
    /// Rebuild everything.
    AllFiles,
}

/// A fully resolved build invocation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    pub command_line: String,
    pub scope: Scope,
}

/// Maps changed-path sets to build invocations.
///
/// Paths are expected relative to the project root with forward slashes,
/// e.g. `"source/posts/hello.adoc"` or `"config.rb"`.
#[derive(Debug, Clone)]
pub struct CommandMapper {
    source_root: String,
    command: String,
    scoped_command: Option<String>,
    rewrites: Vec<RewriteRule>,
}

impl CommandMapper {
    pub fn new(
        source_root: impl Into<String>,
        command: impl Into<String>,
        scoped_command: Option<String>,
        rewrites: Vec<RewriteRule>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            command: command.into(),
            scoped_command,
            rewrites,
        }
    }

    pub fn from_config(build: &BuildSection) -> Self {
        Self::new(
            build.source_root.clone(),
            build.command.clone(),
            build.scoped_command.clone(),
            build.rewrite.clone(),
        )
    }

    /// Map a batch of changed paths to one invocation.
    ///
    /// Total: unknown or ambiguous inputs degrade to [`Scope::AllFiles`],
    /// they never fail.
    pub fn map(&self, changed: &BTreeSet<String>) -> BuildInvocation {
        let scope = self.scope_for(changed);
        let command_line = self.command_line(&scope);
        BuildInvocation {
            command_line,
            scope,
        }
    }

    /// The unscoped full-rebuild invocation.
    pub fn full_build(&self) -> BuildInvocation {
        BuildInvocation {
            command_line: self.command.clone(),
            scope: Scope::AllFiles,
        }
    }

    fn scope_for(&self, changed: &BTreeSet<String>) -> Scope {
        // Without a scoped template there is nothing to narrow.
        if self.scoped_command.is_none() {
            return Scope::AllFiles;
        }

        // Batches of more than one path always rebuild everything.
        let mut iter = changed.iter();
        let (Some(path), None) = (iter.next(), iter.next()) else {
            return Scope::AllFiles;
        };

        let prefix = format!("{}/", self.source_root);
        let Some(rel) = path.strip_prefix(&prefix) else {
            // Outside the source root, e.g. a top-level config file.
            return Scope::AllFiles;
        };

        if rel.ends_with('*') {
            return Scope::Glob(rel.to_string());
        }

        for rule in &self.rewrites {
            if let Some(stem) = rel.strip_suffix(rule.from.as_str()) {
                return Scope::Glob(format!("{stem}{}", rule.to));
            }
        }

        Scope::AllFiles
    }

    fn command_line(&self, scope: &Scope) -> String {
        match (scope, &self.scoped_command) {
            (Scope::Glob(glob), Some(template)) => template.replace(GLOB_PLACEHOLDER, glob),
            _ => self.command.clone(),
        }
    }
}
