use std::{fs, io::ErrorKind, path::Path};

use tracing::{debug, info};

use super::{Config, ConfigPaths};
use crate::{MediaControlsError, Result};

impl Config {
    /// Load the configuration from `path`.
    ///
    /// A missing file yields the defaults. Unknown keys are ignored and
    /// missing keys take their default value.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Config> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::from_toml_str(&content)
            .map_err(|e| MediaControlsError::toml_parse(e, Some(path)))?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load the configuration from the default location.
    ///
    /// # Errors
    /// Returns error if the config directory cannot be resolved or the file
    /// cannot be read or parsed
    pub fn load_default() -> Result<Config> {
        Self::load(&ConfigPaths::main_config()?)
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns error if `content` is not valid configuration TOML
    pub fn from_toml_str(content: &str) -> std::result::Result<Config, toml::de::Error> {
        toml::from_str(content)
    }
}
