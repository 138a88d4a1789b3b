//! Configuration management for pie.
//!
//! This module provides configuration loading, validation, and access through a singleton pattern.
//! Configuration is read from a JSON settings object under the "pie" key and merged with defaults.

pub mod schema;

pub use schema::PieConfig;

use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::RwLock;

/// Key of the settings object that holds pie's configuration.
pub const SETTINGS_KEY: &str = "pie";

/// Global configuration instance.
///
/// This is lazily initialized on first access and can be updated at runtime.
static CONFIG: Lazy<RwLock<PieConfig>> = Lazy::new(|| RwLock::new(PieConfig::default()));

/// Loads configuration from a JSON settings value.
///
/// Reads the "pie" settings, merges them with defaults, validates the result,
/// and updates the global configuration. Settings of the wrong shape are
/// ignored with a warning; settings that fail validation are an error.
///
/// # Arguments
///
/// * `settings_json` - Settings object holding a `"pie"` section, if any
///
/// # Returns
///
/// The loaded configuration, or an error message when validation fails.
///
/// # Example
///
/// ```
/// use pie::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "pie": {
///         "color": false
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert!(!config.color);
/// # pie::config::reset_config();
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<PieConfig, String> {
    let mut config = PieConfig::default();

    if let Some(settings) = settings_json {
        if let Some(pie_settings) = settings.get(SETTINGS_KEY) {
            match serde_json::from_value::<PieConfig>(pie_settings.clone()) {
                Ok(user_config) => {
                    config = config.merge(&user_config);
                }
                Err(e) => {
                    log::warn!("Failed to parse pie settings: {}. Using defaults.", e);
                }
            }
        }
    }

    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    if let Ok(mut global_config) = CONFIG.write() {
        *global_config = config.clone();
    }

    Ok(config)
}

/// Gets a copy of the current global configuration.
///
/// Returns the defaults if nothing has been loaded yet.
pub fn get_config() -> PieConfig {
    CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|_| PieConfig::default())
}

/// Updates the global configuration in place.
///
/// An update that leaves the configuration invalid reverts it to defaults.
///
/// # Example
///
/// ```
/// use pie::config::{get_config, reset_config, update_config};
///
/// update_config(|config| config.raw = true);
/// assert!(get_config().raw);
/// reset_config();
/// ```
pub fn update_config<F>(updater: F)
where
    F: FnOnce(&mut PieConfig),
{
    if let Ok(mut config) = CONFIG.write() {
        updater(&mut config);

        if let Err(e) = config.validate() {
            log::warn!("Configuration validation failed after update: {}", e);
            *config = PieConfig::default();
        }
    }
}

/// Resets the configuration to defaults.
pub fn reset_config() {
    if let Ok(mut config) = CONFIG.write() {
        *config = PieConfig::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, PieConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_config_with_user_settings() {
        let settings = json!({
            "pie": {
                "color": false,
                "raw": true,
                "defaultHeaders": {
                    "Accept": "application/json"
                }
            }
        });

        let config = load_config(Some(settings)).unwrap();
        assert!(!config.color);
        assert!(config.raw);
        assert!(config.headers);
        assert_eq!(config.default_headers.len(), 2);
        assert!(config.default_headers.contains_key("User-Agent"));

        reset_config();
    }

    #[test]
    #[serial]
    fn test_load_config_invalid_json() {
        let settings = json!({
            "pie": {
                "color": "not-a-bool"
            }
        });

        let config = load_config(Some(settings)).unwrap();
        assert!(config.color);
    }

    #[test]
    #[serial]
    fn test_load_config_validation_error() {
        let settings = json!({
            "pie": {
                "defaultHeaders": { "X Bad": "1" }
            }
        });

        let result = load_config(Some(settings));
        assert!(result
            .unwrap_err()
            .contains("defaultHeaders contains invalid header name"));
    }

    #[test]
    #[serial]
    fn test_get_config() {
        reset_config();
        assert!(!get_config().raw);

        load_config(Some(json!({ "pie": { "raw": true } }))).unwrap();
        assert!(get_config().raw);

        reset_config();
    }

    #[test]
    #[serial]
    fn test_update_config() {
        reset_config();

        update_config(|config| {
            config.headers = false;
        });
        assert!(!get_config().headers);

        reset_config();
    }

    #[test]
    #[serial]
    fn test_update_config_with_invalid_value() {
        reset_config();

        update_config(|config| {
            config.color = false;
            config
                .default_headers
                .insert(String::new(), "x".to_string());
        });

        assert_eq!(get_config(), PieConfig::default());
    }

    #[test]
    #[serial]
    fn test_no_pie_key() {
        let settings = json!({
            "other-tool": {
                "color": false
            }
        });

        let config = load_config(Some(settings)).unwrap();
        assert!(config.color);
    }
}
