/// Blacklist policy for ignored players
pub mod blacklist;
/// Outbound calls to the user interface
pub mod display;
/// Per-role endpoint contracts and their D-Bus implementation
pub mod endpoint;
/// Media player error types
pub mod error;
/// Track metadata types
pub mod metadata;
/// Live handle for a single player
pub mod player;
/// Bus name lifecycle events
pub mod presence;
/// Typed MPRIS properties
pub mod properties;
/// D-Bus proxy trait definitions
pub mod proxy;
/// Connected player registry
pub mod registry;
/// Active player selection
pub mod selector;
/// Service facade wiring the pieces together
pub mod service;
/// Identifiers and status enums
pub mod types;

#[cfg(test)]
mod tests;

pub use blacklist::Blacklist;
pub use display::{DisplaySink, TracingDisplay, WidgetFlags};
pub use endpoint::DbusConnector;
pub use error::*;
pub use metadata::TrackMetadata;
pub use player::{PlayerHandle, PlayerState, PollSettings, PropertyChangeBus, Subscription};
pub use presence::{DbusPresenceWatcher, PresenceEvent, PresenceWatcher};
pub use properties::*;
pub use proxy::*;
pub use registry::PlayerRegistry;
pub use selector::{ActivePlayerSelector, choose};
pub use service::MprisService;
pub use types::*;
