//! Unit tests for config_store module
//! No filesystem, timing, or external dependencies.

#![allow(clippy::panic, clippy::unwrap_used)]

use futures::StreamExt;
use toml::Value;

use super::{diff::diff_configs, path_ops::path_matches};
use crate::{
    config::{Config, LogLevel},
    config_store::{ConfigChange, ConfigStore},
};

#[test]
fn config_change_new() {
    let change = ConfigChange::new(
        "media.hide_media_notification".to_string(),
        Some(Value::Boolean(true)),
        Value::Boolean(false),
    );

    assert_eq!(change.path, "media.hide_media_notification");
    assert_eq!(change.old_value, Some(Value::Boolean(true)));
    assert_eq!(change.new_value, Value::Boolean(false));
    assert!(change.timestamp.elapsed().as_secs() < 1);
}

#[test]
fn path_patterns() {
    assert!(path_matches("media.poll_interval_ms", "*"));
    assert!(path_matches("media.poll_interval_ms", "media.*"));
    assert!(path_matches("media.poll_interval_ms", "media.poll_interval_ms"));
    assert!(!path_matches("lyrics.enabled", "media.*"));
    assert!(!path_matches("media", "media.poll_interval_ms"));
}

#[test]
fn diff_reports_changed_leaves() {
    let old = Config::default();
    let mut new = old.clone();
    new.general.log_level = LogLevel::Trace;
    new.media.blacklisted_players = vec!["spotify".to_string()];

    let changes = diff_configs(&old, &new).unwrap();
    let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();

    assert_eq!(paths, vec!["general.log_level", "media.blacklisted_players"]);
    assert_eq!(changes[0].new_value, Value::String("trace".to_string()));
}

#[test]
fn diff_of_equal_configs_is_empty() {
    let config = Config::default();
    assert!(diff_configs(&config, &config).unwrap().is_empty());
}

#[test]
fn store_with_defaults() {
    let store = ConfigStore::with_defaults();

    assert_eq!(store.get_current(), Config::default());
    assert!(store.path().is_none());
    assert!(store.reload().unwrap().is_empty());
}

#[tokio::test]
async fn replace_broadcasts_matching_changes() {
    let store = ConfigStore::with_defaults();
    let mut media = Box::pin(store.subscribe_to_path("media.*"));

    let mut new = Config::default();
    new.lyrics.enabled = false;
    new.media.hide_media_notification = false;

    let changes = store.replace(new).unwrap();
    assert_eq!(changes.len(), 2);

    let change = media.next().await.unwrap();
    assert_eq!(change.path, "media.hide_media_notification");
    assert_eq!(change.new_value, Value::Boolean(false));
}

#[test]
fn store_clone_shares_state() {
    let store1 = ConfigStore::with_defaults();
    let store2 = store1.clone();

    let mut new = Config::default();
    new.media.poll_interval_ms = 50;
    store1.replace(new).unwrap();

    assert_eq!(store2.get_current().media.poll_interval_ms, 50);
}
