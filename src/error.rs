//! Error types for folio operations.

use thiserror::Error;

/// Errors that can occur while turning source text into a rendered document.
///
/// Everything past parsing is infallible: unrecognized embeds, heading id
/// collisions and sanitized content are resolved silently.
#[derive(Error, Debug)]
pub enum Error {
    /// The source text could not be parsed; the content is unavailable.
    #[error("content unavailable: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
