use std::{collections::BTreeSet, time::Instant};

use toml::Value;

use super::{ConfigChange, ConfigError};
use crate::config::Config;

/// Compares two configurations and returns one change per differing leaf.
///
/// Both sides are serialized with every default filled in, so a key removed
/// from the file shows up as a change back to its default value. Arrays
/// are compared as whole values.
///
/// # Errors
/// Returns error if either configuration cannot be serialized to TOML.
pub fn diff_configs(old: &Config, new: &Config) -> Result<Vec<ConfigChange>, ConfigError> {
    let old_value = to_value(old)?;
    let new_value = to_value(new)?;

    let mut changes = Vec::new();
    diff_values("", &old_value, &new_value, Instant::now(), &mut changes);

    Ok(changes)
}

fn to_value(config: &Config) -> Result<Value, ConfigError> {
    Value::try_from(config).map_err(|e| ConfigError::SerializationError {
        content_type: "config".to_string(),
        details: e.to_string(),
    })
}

fn diff_values(
    path: &str,
    old: &Value,
    new: &Value,
    timestamp: Instant,
    changes: &mut Vec<ConfigChange>,
) {
    match (old, new) {
        (Value::Table(old_table), Value::Table(new_table)) => {
            let keys: BTreeSet<&String> = old_table.keys().chain(new_table.keys()).collect();

            for key in keys {
                let field_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };

                match (old_table.get(key), new_table.get(key)) {
                    (Some(old_val), Some(new_val)) => {
                        diff_values(&field_path, old_val, new_val, timestamp, changes);
                    }
                    (old_val, Some(new_val)) => changes.push(ConfigChange {
                        path: field_path,
                        old_value: old_val.cloned(),
                        new_value: new_val.clone(),
                        timestamp,
                    }),
                    (Some(_), None) | (None, None) => {}
                }
            }
        }
        _ => {
            if old != new {
                changes.push(ConfigChange {
                    path: path.to_string(),
                    old_value: Some(old.clone()),
                    new_value: new.clone(),
                    timestamp,
                });
            }
        }
    }
}
