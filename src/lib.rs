//! mediacontrols - MPRIS player tracking for a desktop media widget.
//!
//! Follows every MPRIS player on the session bus, keeps a live model of each
//! one and decides which player the widget should show. The main pieces are:
//!
//! - A registry of connected players driven by bus name presence
//! - Active player selection with pinning
//! - Lyric routing from an external provider to the active player
//! - TOML configuration with hot reload
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mediacontrols::{
//!     config::Config,
//!     services::mpris::{MprisService, TracingDisplay},
//! };
//!
//! # async fn run() -> mediacontrols::Result<()> {
//! let service = MprisService::start(&Config::default(), Arc::new(TracingDisplay)).await?;
//!
//! if let Some(player) = service.active_player() {
//!     println!("Active: {}", player.display_name());
//! }
//! # Ok(())
//! # }
//! ```

/// Configuration schema definitions and validation.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Configuration store with change tracking and hot reload.
pub mod config_store;

/// Reactive services for system integration.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{MediaControlsError, Result};
