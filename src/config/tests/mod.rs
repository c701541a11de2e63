//! Unit tests for config module
//!
//! Tests configuration types, defaults, and serialization.
//! No filesystem dependencies - all in-memory.

#![allow(clippy::panic, clippy::unwrap_used)]

use std::time::Duration;

use crate::config::{Config, LogLevel};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert!(config.media.blacklisted_players.is_empty());
    assert!(config.media.hide_media_notification);
    assert!(config.lyrics.enabled);
}

#[test]
fn config_serialize_toml() {
    let toml_str = toml::to_string(&Config::default()).unwrap();

    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[media]"));
    assert!(toml_str.contains("[lyrics]"));
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [media]
        blacklisted_players = ["firefox", "chromium.desktop"]
        hide_media_notification = false
        poll_interval_ms = 100

        [lyrics]
        enabled = false
    "#;

    let config = Config::from_toml_str(toml_str).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(
        config.media.blacklisted_players,
        vec!["firefox".to_string(), "chromium.desktop".to_string()]
    );
    assert!(!config.media.hide_media_notification);
    assert_eq!(config.media.poll_interval_ms, 100);
    assert_eq!(config.media.poll_timeout_ms, 5000);
    assert!(!config.lyrics.enabled);
}

#[test]
fn config_empty_toml() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn config_invalid_toml() {
    let invalid_toml = r#"
        [general
        invalid syntax here
    "#;

    assert!(Config::from_toml_str(invalid_toml).is_err());
}

#[test]
fn config_invalid_log_level() {
    let toml_str = r#"
        [general]
        log_level = "loud"
    "#;

    assert!(Config::from_toml_str(toml_str).is_err());
}

#[test]
fn config_unknown_fields() {
    let toml_with_unknown = r#"
        [media]
        unknown_field = "should be ignored"

        [unknown_section]
        some_field = "ignored"
    "#;

    let config = Config::from_toml_str(toml_with_unknown).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn media_poll_settings() {
    let config = Config::default();
    let settings = config.media.poll_settings();

    assert_eq!(settings.interval, Duration::from_millis(250));
    assert_eq!(settings.max_attempts, 20);
}

#[test]
fn media_blacklist() {
    let toml_str = r#"
        [media]
        blacklisted_players = ["Spotify.desktop"]
    "#;

    let config = Config::from_toml_str(toml_str).unwrap();
    let blacklist = config.media.blacklist();

    assert!(blacklist.matches("spotify", ""));
    assert!(!blacklist.matches("vlc", "VLC media player"));
}

#[test]
fn config_schema_describes_sections() {
    let schema = schemars::schema_for!(Config);
    let json = serde_json::to_string(&schema).unwrap();

    assert!(json.contains("blacklisted_players"));
    assert!(json.contains("hide_media_notification"));
    assert!(json.contains("log_level"));
}
