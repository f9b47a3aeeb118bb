//! Crate-wide error type
//!
//! Only one condition is fatal during parsing: a missing mandatory header
//! field. Everything else degrades into accumulated warnings (see
//! [`crate::diagnostics`]). MIDI and I/O failures are fatal at the CLI
//! boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabError {
    #[error("missing mandatory header field: '{0}:'")]
    MissingHeader(&'static str),
    #[error("midi write error: {0}")]
    Midi(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TabError>;
