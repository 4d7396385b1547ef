//! Registry configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning of the [`DirectiveRegistry`](crate::DirectiveRegistry) stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Inactivity after which a stored directive is reclaimed
    pub entry_idle_ms: u64,
    /// Inactivity after which a per-key lock is reclaimed
    pub lock_idle_ms: u64,
    /// Upper bound of entries per store
    pub max_capacity: u64,
}

impl RegistryConfig {
    /// Set the stored directive inactivity window
    #[must_use]
    pub fn with_entry_idle(mut self, idle: Duration) -> Self {
        self.entry_idle_ms = duration_ms(idle);
        self
    }

    /// Set the per-key lock inactivity window
    #[must_use]
    pub fn with_lock_idle(mut self, idle: Duration) -> Self {
        self.lock_idle_ms = duration_ms(idle);
        self
    }

    /// Set the per-store capacity
    #[must_use]
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Stored directive inactivity window
    #[inline]
    #[must_use]
    pub fn entry_idle(&self) -> Duration {
        Duration::from_millis(self.entry_idle_ms)
    }

    /// Per-key lock inactivity window
    #[inline]
    #[must_use]
    pub fn lock_idle(&self) -> Duration {
        Duration::from_millis(self.lock_idle_ms)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            entry_idle_ms: 600_000,
            lock_idle_ms: 30_000,
            max_capacity: 100_000,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = RegistryConfig::default()
            .with_entry_idle(Duration::from_secs(2))
            .with_lock_idle(Duration::from_millis(250))
            .with_max_capacity(10);

        assert_eq!(config.entry_idle(), Duration::from_secs(2));
        assert_eq!(config.lock_idle(), Duration::from_millis(250));
        assert_eq!(config.max_capacity, 10);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: RegistryConfig = serde_json::from_str(r#"{"lock_idle_ms": 5}"#).unwrap();
        assert_eq!(config.lock_idle_ms, 5);
        assert_eq!(config.entry_idle_ms, RegistryConfig::default().entry_idle_ms);
    }
}
