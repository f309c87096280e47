// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{Result, SitewatchError};

/// Placeholder that the scoped command template must carry.
pub const GLOB_PLACEHOLDER: &str = "{glob}";

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `build.command` is non-empty
/// - `build.scoped_command`, if set, contains the `{glob}` placeholder
/// - `build.source_root` is non-empty and has no trailing slash
/// - rewrite rules have non-empty `from` / `to` suffixes
/// - there is at least one watch entry with a non-empty path
/// - ignore suffixes are non-empty strings
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_build(cfg)?;
    validate_watch(cfg)?;
    validate_ignore(cfg)?;
    Ok(())
}

fn validate_build(cfg: &ConfigFile) -> Result<()> {
    if cfg.build.command.trim().is_empty() {
        return Err(config_err("[build].command must not be empty"));
    }

    if let Some(scoped) = &cfg.build.scoped_command {
        if !scoped.contains(GLOB_PLACEHOLDER) {
            return Err(config_err(format!(
                "[build].scoped_command must contain the {GLOB_PLACEHOLDER} placeholder"
            )));
        }
    }

    if cfg.build.source_root.is_empty() {
        return Err(config_err("[build].source_root must not be empty"));
    }
    if cfg.build.source_root.ends_with('/') {
        return Err(config_err(format!(
            "[build].source_root must not end with '/' (got {:?})",
            cfg.build.source_root
        )));
    }

    for rule in &cfg.build.rewrite {
        if rule.from.is_empty() || rule.to.is_empty() {
            return Err(config_err(
                "[[build.rewrite]] entries must have non-empty `from` and `to`",
            ));
        }
    }

    Ok(())
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    if cfg.watch.is_empty() {
        return Err(config_err("config must contain at least one [[watch]] entry"));
    }
    for entry in &cfg.watch {
        if entry.path.is_empty() {
            return Err(config_err("[[watch]] entries must have a non-empty `path`"));
        }
    }
    Ok(())
}

fn validate_ignore(cfg: &ConfigFile) -> Result<()> {
    for suffix in &cfg.ignore {
        if suffix.is_empty() {
            return Err(config_err("`ignore` entries must be non-empty suffixes"));
        }
    }
    Ok(())
}

fn config_err(msg: impl Into<String>) -> SitewatchError {
    SitewatchError::Config(msg.into())
}
