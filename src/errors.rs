// src/errors.rs

//! Crate-wide error types.
//!
//! Structured errors cover the configuration layer; the rest of the
//! application plumbing uses `anyhow` with context, which converts from
//! these via `Other`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitewatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SitewatchError>;
