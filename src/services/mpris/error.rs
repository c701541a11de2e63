use super::PlayerId;

/// Errors that can occur during media operations
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// Player with the given ID was not found
    #[error("Player {0:?} not found")]
    PlayerNotFound(PlayerId),

    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),

    /// Player endpoints have not been connected yet
    #[error("Player {0:?} is not initialized")]
    NotInitialized(PlayerId),

    /// A second initialization was attempted on the same player
    #[error("Player {0:?} is already initialized")]
    AlreadyInitialized(PlayerId),

    /// A D-Bus value did not have the expected type
    #[error("Unexpected value for property {property}: {details}")]
    InvalidValue {
        /// Name of the property being decoded
        property: String,
        /// What went wrong while decoding
        details: String,
    },

    /// Failed to initialize the media service
    #[error("Failed to initialize media service: {0}")]
    InitializationFailed(String),

    /// Failed to control the player
    #[error("Failed to control player: {0}")]
    ControlFailed(String),
}

impl From<zbus::fdo::Error> for MediaError {
    fn from(error: zbus::fdo::Error) -> Self {
        Self::DbusError(error.into())
    }
}
