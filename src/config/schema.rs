//! Configuration schema for pie.
//!
//! This module defines the settings structure and its validation. Settings are
//! read from a JSON object under the "pie" key; every field has a default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-configurable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieConfig {
    /// Headers sent with every request unless the file overrides them.
    ///
    /// Names are matched case-insensitively against the file's headers.
    /// Defaults to a `User-Agent` identifying this crate.
    #[serde(default = "default_headers")]
    pub default_headers: BTreeMap<String, String>,

    /// Whether CLI output is colorized. Defaults to true.
    #[serde(default = "default_color")]
    pub color: bool,

    /// Whether headers are printed along with a materialized request.
    /// Defaults to true.
    #[serde(default = "default_show_headers")]
    pub headers: bool,

    /// Print materialized requests as JSON instead of text. Defaults to false.
    #[serde(default)]
    pub raw: bool,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            default_headers: default_headers(),
            color: default_color(),
            headers: default_show_headers(),
            raw: false,
        }
    }
}

impl PieConfig {
    /// Validates the configuration and returns errors if any settings are invalid.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all settings are valid, or `Err` with a descriptive error message.
    pub fn validate(&self) -> Result<(), String> {
        for name in self.default_headers.keys() {
            if !is_valid_header_name(name) {
                return Err(format!("defaultHeaders contains invalid header name '{}'", name));
            }
        }

        Ok(())
    }

    /// Merges this configuration with another, using values from `other` where present.
    ///
    /// Default headers are combined: entries from `other` replace entries with the
    /// same (case-insensitive) name and keep the rest.
    pub fn merge(&self, other: &PieConfig) -> Self {
        let mut default_headers = self.default_headers.clone();
        for (name, value) in &other.default_headers {
            default_headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            default_headers.insert(name.clone(), value.clone());
        }

        Self {
            default_headers,
            color: other.color,
            headers: other.headers,
            raw: other.raw,
        }
    }
}

/// RFC 7230 token characters.
fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

// Default value functions for serde

fn default_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(
        "User-Agent".to_string(),
        format!("pie/{}", env!("CARGO_PKG_VERSION")),
    );
    headers
}

fn default_color() -> bool {
    true
}

fn default_show_headers() -> bool {
    true
}
