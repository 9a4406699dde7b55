//! Pipeline and tracker configuration.
//!
//! Everything has a default; a JSON file only needs the keys it changes:
//!
//! ```json
//! {
//!   "embeds": true,
//!   "sanitize": { "attributes": { "span": ["class"] } },
//!   "tracker": { "activationOffset": 150, "anchorOffset": 100 }
//! }
//! ```

use crate::sanitize::SchemaExtension;
use crate::tracker::TrackerConfig;

#[cfg(feature = "cli")]
use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default, deny_unknown_fields))]
pub struct Config {
    /// Rewrite Google Drive and YouTube links into embedded players.
    pub embeds: bool,
    /// Extra tags, attributes and protocols for the sanitizer.
    pub sanitize: SchemaExtension,
    pub tracker: TrackerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embeds: true,
            sanitize: SchemaExtension::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

#[cfg(feature = "cli")]
impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
