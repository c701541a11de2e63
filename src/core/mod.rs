use std::path::Path;

use thiserror::Error;

use crate::services::{lyric::LyricError, mpris::MediaError};

/// Error types for the media controls daemon.
///
/// Covers configuration loading and parsing plus the service errors that
/// can surface while starting up.
#[derive(Error, Debug)]
pub enum MediaControlsError {
    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Media service error
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Lyric service error
    #[error(transparent)]
    Lyric(#[from] LyricError),
}

/// A specialized `Result` type for media controls operations.
pub type Result<T> = std::result::Result<T, MediaControlsError>;

impl MediaControlsError {
    /// Creates a TOML parsing error with optional file path context.
    pub fn toml_parse(error: impl std::fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        MediaControlsError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }
}
