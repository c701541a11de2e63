use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lyric channel configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct LyricsConfig {
    /// Accept lyric lines from an external helper over D-Bus.
    pub enabled: bool,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
