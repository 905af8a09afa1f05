//! Framework error type.
//!
//! Sub-crates define their own error enums and either convert them into
//! `CoreError` via `From` impls or wrap `CoreError` as one variant.

use thiserror::Error;

/// The base error type shared by `ms-*` crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ms-core`.
pub type CoreResult<T> = Result<T, CoreError>;
