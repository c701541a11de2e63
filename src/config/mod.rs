//! Configuration schema definitions.
//!
//! Defines the configuration of the media controls daemon. All sections
//! are serializable to/from TOML and every key has a default.

mod general;
mod loading;
mod lyrics;
mod media;
mod paths;

#[cfg(test)]
mod tests;

pub use general::{GeneralConfig, LogLevel};
pub use lyrics::LyricsConfig;
pub use media::MediaConfig;
pub use paths::ConfigPaths;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Player tracking settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Lyric channel settings.
    #[serde(default)]
    pub lyrics: LyricsConfig,
}
