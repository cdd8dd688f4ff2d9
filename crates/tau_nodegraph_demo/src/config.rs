// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo configuration.
//!
//! Stored as RON. Every section has defaults, so a file only needs the
//! values it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Error loading or saving a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for [`DemoConfig`]
    #[error("Invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing the configuration failed
    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version of the demo
    #[error("Configuration version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version understood
        supported: u32,
    },
}

/// Inputs of the `x + y` graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddScenario {
    /// First operand
    pub x: i32,
    /// Second operand
    pub y: i32,
}

impl Default for AddScenario {
    fn default() -> Self {
        Self { x: 3, y: 4 }
    }
}

/// Inputs of the selector graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorScenario {
    /// Value on `Control`
    pub control: bool,
    /// Branch taken while `control` is true
    pub x: f64,
    /// Branch taken otherwise
    pub y: f64,
}

impl Default for SelectorScenario {
    fn default() -> Self {
        Self {
            control: true,
            x: 10.0,
            y: 20.0,
        }
    }
}

/// Inputs of `sqrt(f32(i32(input) + offset) / divisor)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastChainScenario {
    /// Float fed to the first cast
    pub input: f32,
    /// Added after truncation
    pub offset: i32,
    /// Divides the widened sum
    pub divisor: f32,
}

impl Default for CastChainScenario {
    fn default() -> Self {
        Self {
            input: 10.75,
            offset: 5,
            divisor: 4.0,
        }
    }
}

/// Inputs of `(shared + 1) + (shared * 2)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiamondScenario {
    /// Value of the node both branches read
    pub shared: i64,
}

impl Default for DiamondScenario {
    fn default() -> Self {
        Self { shared: 5 }
    }
}

/// Complete demo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Configuration format version
    pub version: u32,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Compute shared ancestors once per pass
    pub memoize: bool,
    /// Add graph
    pub add: AddScenario,
    /// Selector graph
    pub selector: SelectorScenario,
    /// Cast chain graph
    pub cast_chain: CastChainScenario,
    /// Diamond graph
    pub diamond: DiamondScenario,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            log_filter: "info".to_string(),
            memoize: false,
            add: AddScenario::default(),
            selector: SelectorScenario::default(),
            cast_chain: CastChainScenario::default(),
            diamond: DiamondScenario::default(),
        }
    }
}

impl DemoConfig {
    /// Parse a configuration from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig = ron::from_str(content)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Render as pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert!(!config.memoize);
        assert_eq!(config.add, AddScenario { x: 3, y: 4 });
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = DemoConfig::from_ron("(memoize: true, diamond: (shared: 9))").unwrap();
        assert!(config.memoize);
        assert_eq!(config.diamond.shared, 9);
        assert_eq!(config.selector, SelectorScenario::default());
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = DemoConfig::from_ron("(version: 99)").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedVersion {
                found: 99,
                supported: CONFIG_FORMAT_VERSION
            }
        ));
    }

    #[test]
    fn test_invalid_ron() {
        assert!(matches!(
            DemoConfig::from_ron("(add: (x: \"three\"))"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.ron");

        let mut config = DemoConfig::default();
        config.cast_chain.input = -2.5;
        config.log_filter = "tau_nodegraph=debug".to_string();
        config.save(&path).unwrap();

        let loaded = DemoConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DemoConfig::load(&dir.path().join("absent.ron")),
            Err(ConfigError::Io(_))
        ));
    }
}
