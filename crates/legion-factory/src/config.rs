//! Workspace configuration loaded from TOML

use crate::error::ConfigError;
use legion_directive::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ramp-up settings applied by the [`CampaignLauncher`](crate::CampaignLauncher)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampUpDefaults {
    /// Delay before the first start, absorbing directive propagation
    pub start_offset_ms: u64,
    /// Ramp-up speed factor
    pub speed_factor: f64,
}

impl Default for RampUpDefaults {
    fn default() -> Self {
        Self {
            start_offset_ms: 1_000,
            speed_factor: 1.0,
        }
    }
}

/// Configuration of a Legion node
///
/// ```toml
/// [registry]
/// entry_idle_ms = 600000
/// lock_idle_ms = 30000
///
/// [ramp_up]
/// start_offset_ms = 2000
/// speed_factor = 1.5
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegionConfig {
    /// Directive registry tuning
    pub registry: RegistryConfig,
    /// Ramp-up settings
    pub ramp_up: RampUpDefaults,
}

impl LegionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With registry tuning
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// With ramp-up settings
    #[inline]
    #[must_use]
    pub fn with_ramp_up(mut self, ramp_up: RampUpDefaults) -> Self {
        self.ramp_up = ramp_up;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let speed_factor = self.ramp_up.speed_factor;
        if !speed_factor.is_finite() || speed_factor <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "ramp_up.speed_factor",
                reason: format!("must be positive and finite, got {speed_factor}"),
            });
        }
        if self.registry.entry_idle_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "registry.entry_idle_ms",
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.registry.lock_idle_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "registry.lock_idle_ms",
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}
