//! Directive keys and identifier generation

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque unique identifier of a directive
///
/// Generated once when the directive is created and stable for its whole
/// lifecycle. Only the key (and routing metadata) crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectiveKey(String);

impl DirectiveKey {
    /// Wrap an existing key
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh collision-resistant key
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(UlidGenerator.generate())
    }

    /// Borrow the key as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DirectiveKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DirectiveKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Supplier of short unique identifiers for minions and directive keys
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Produce a new identifier, never returned before by this generator
    fn generate(&self) -> String;
}

/// [`IdGenerator`] backed by lowercase ULIDs (sortable by creation time)
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidGenerator;

impl IdGenerator for UlidGenerator {
    fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}
