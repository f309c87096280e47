// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [build]
/// command = "bundle exec middleman build --environment=development"
/// scoped_command = "bundle exec middleman build --environment=development --glob='{glob}' --no-clean"
/// source_root = "source"
/// output_root = "build"
///
/// [[build.rewrite]]
/// from = ".adoc"
/// to = ".html"
///
/// ignore = [".bak", ".bkp"]
///
/// [[watch]]
/// path = "source"
/// recursive = true
///
/// [reload]
/// command = "curl -s http://localhost:35729/changed"
/// ```
///
/// All sections except `[build]` are optional and have defaults that mirror
/// a typical site layout (`source/` tree, backup-file ignores).
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Build command templates and path mapping from `[build]`.
    pub build: BuildSection,

    /// Suffixes of files whose changes are dropped before coalescing.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Directories (or single files) to watch, from `[[watch]]`.
    #[serde(default = "default_watch")]
    pub watch: Vec<WatchEntry>,

    /// Reload notification from `[reload]`.
    #[serde(default)]
    pub reload: ReloadSection,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// The unscoped build command, used when everything must be rebuilt.
    pub command: String,

    /// Scoped build command template containing a `{glob}` placeholder.
    ///
    /// If `None`, every build runs unscoped.
    #[serde(default)]
    pub scoped_command: Option<String>,

    /// Root directory of the sources, relative to the project root.
    ///
    /// Only changes under this root can produce a scoped build.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Directory the build tool writes into. Informational only; sitewatch
    /// schedules writes to it but never serves or cleans it.
    #[serde(default)]
    pub output_root: Option<String>,

    /// Ordered source-suffix → output-suffix rewrite rules used to derive
    /// the scoped glob from a changed path. First matching rule wins.
    #[serde(default = "default_rewrites")]
    pub rewrite: Vec<RewriteRule>,
}

/// A single suffix rewrite rule from `[[build.rewrite]]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}

/// A single `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchEntry {
    /// Path relative to the project root. May be a single file.
    pub path: String,

    /// Whether to watch the subtree recursively.
    #[serde(default = "default_true")]
    pub recursive: bool,
}

/// `[reload]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReloadSection {
    /// Optional shell command fired after each build attempt, success or
    /// failure. Spawned fire-and-forget so it can never stall scheduling.
    #[serde(default)]
    pub command: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_source_root() -> String {
    "source".to_string()
}

fn default_ignore() -> Vec<String> {
    vec![".bak".to_string(), ".bkp".to_string()]
}

fn default_watch() -> Vec<WatchEntry> {
    vec![WatchEntry {
        path: default_source_root(),
        recursive: true,
    }]
}

fn default_rewrites() -> Vec<RewriteRule> {
    [
        (".adoc", ".html"),
        (".bib", ".html"),
        (".css.sass", ".css"),
        (".js", ".js"),
    ]
    .into_iter()
    .map(|(from, to)| RewriteRule {
        from: from.to_string(),
        to: to.to_string(),
    })
    .collect()
}
