//! Directive shapes and their wire references
//!
//! A directive is one of four closed variants. Only the key-bearing
//! references travel between nodes; payloads stay in the
//! [`DirectiveRegistry`](crate::DirectiveRegistry) of the node that saved them.

use crate::key::DirectiveKey;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A directive that carries all its data inline and is never stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptiveDirective {
    key: DirectiveKey,
}

impl DescriptiveDirective {
    /// Create new descriptive directive with a fresh key
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            key: DirectiveKey::generate(),
        }
    }

    /// Create descriptive directive with an explicit key
    #[inline]
    #[must_use]
    pub fn with_key(key: DirectiveKey) -> Self {
        Self { key }
    }

    /// Directive key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &DirectiveKey {
        &self.key
    }
}

impl Default for DescriptiveDirective {
    fn default() -> Self {
        Self::new()
    }
}

/// A directive holding one value, consumed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleUseDirective<T> {
    key: DirectiveKey,
    value: T,
}

impl<T> SingleUseDirective<T> {
    /// Create new single-use directive with a fresh key
    #[inline]
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_key(DirectiveKey::generate(), value)
    }

    /// Create single-use directive with an explicit key
    #[inline]
    #[must_use]
    pub fn with_key(key: DirectiveKey, value: T) -> Self {
        Self { key, value }
    }

    /// Directive key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &DirectiveKey {
        &self.key
    }

    /// Stored value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Wire reference to this directive
    #[inline]
    #[must_use]
    pub fn to_reference(&self) -> SingleUseReference<T> {
        SingleUseReference::new(self.key.clone())
    }

    pub(crate) fn into_parts(self) -> (DirectiveKey, T) {
        (self.key, self.value)
    }
}

/// A directive holding an ordered sequence, each value consumed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDirective<T> {
    key: DirectiveKey,
    values: VecDeque<T>,
}

impl<T> QueueDirective<T> {
    /// Create new queue directive with a fresh key
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self::with_key(DirectiveKey::generate(), values)
    }

    /// Create queue directive with an explicit key
    #[must_use]
    pub fn with_key(key: DirectiveKey, values: impl IntoIterator<Item = T>) -> Self {
        Self {
            key,
            values: values.into_iter().collect(),
        }
    }

    /// Directive key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &DirectiveKey {
        &self.key
    }

    /// Values in consumption order
    #[inline]
    #[must_use]
    pub fn values(&self) -> &VecDeque<T> {
        &self.values
    }

    /// Number of values still queued
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the queue holds nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Wire reference to this directive
    #[inline]
    #[must_use]
    pub fn to_reference(&self) -> QueueReference<T> {
        QueueReference::new(self.key.clone())
    }

    pub(crate) fn into_parts(self) -> (DirectiveKey, VecDeque<T>) {
        (self.key, self.values)
    }
}

/// A directive holding an immutable sequence that may be read many times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDirective<T> {
    key: DirectiveKey,
    values: Vec<T>,
}

impl<T> ListDirective<T> {
    /// Create new list directive with a fresh key
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self::with_key(DirectiveKey::generate(), values)
    }

    /// Create list directive with an explicit key
    #[must_use]
    pub fn with_key(key: DirectiveKey, values: impl IntoIterator<Item = T>) -> Self {
        Self {
            key,
            values: values.into_iter().collect(),
        }
    }

    /// Directive key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &DirectiveKey {
        &self.key
    }

    /// Stored values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Wire reference to this directive
    #[inline]
    #[must_use]
    pub fn to_reference(&self) -> ListReference<T> {
        ListReference::new(self.key.clone())
    }

    pub(crate) fn into_parts(self) -> (DirectiveKey, Vec<T>) {
        (self.key, self.values)
    }
}

/// Closed set of directive shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<T> {
    /// Self-contained, never stored
    Descriptive(DescriptiveDirective),
    /// One value, consumed once
    SingleUse(SingleUseDirective<T>),
    /// FIFO values, each consumed once
    Queue(QueueDirective<T>),
    /// Immutable, re-readable sequence
    List(ListDirective<T>),
}

impl<T> Directive<T> {
    /// Key of the directive, whatever its shape
    #[must_use]
    pub fn key(&self) -> &DirectiveKey {
        match self {
            Self::Descriptive(d) => d.key(),
            Self::SingleUse(d) => d.key(),
            Self::Queue(d) => d.key(),
            Self::List(d) => d.key(),
        }
    }
}

impl<T> From<DescriptiveDirective> for Directive<T> {
    fn from(d: DescriptiveDirective) -> Self {
        Self::Descriptive(d)
    }
}

impl<T> From<SingleUseDirective<T>> for Directive<T> {
    fn from(d: SingleUseDirective<T>) -> Self {
        Self::SingleUse(d)
    }
}

impl<T> From<QueueDirective<T>> for Directive<T> {
    fn from(d: QueueDirective<T>) -> Self {
        Self::Queue(d)
    }
}

impl<T> From<ListDirective<T>> for Directive<T> {
    fn from(d: ListDirective<T>) -> Self {
        Self::List(d)
    }
}

// References carry the payload type only at compile time, so the usual
// derives would wrongly demand `T: Clone`, `T: Eq` and so on.
macro_rules! typed_reference {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize)]
        #[serde(bound = "")]
        pub struct $name<T> {
            key: DirectiveKey,
            #[serde(skip)]
            payload: PhantomData<fn() -> T>,
        }

        impl<T> $name<T> {
            /// Create reference to the directive stored under `key`
            #[inline]
            #[must_use]
            pub fn new(key: DirectiveKey) -> Self {
                Self {
                    key,
                    payload: PhantomData,
                }
            }

            /// Key of the referenced directive
            #[inline]
            #[must_use]
            pub fn key(&self) -> &DirectiveKey {
                &self.key
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self::new(self.key.clone())
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct($label).field("key", &self.key).finish()
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> Hash for $name<T> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.key.hash(state);
            }
        }
    };
}

typed_reference!(
    /// Wire reference to a [`SingleUseDirective`]
    SingleUseReference,
    "SingleUseReference"
);

typed_reference!(
    /// Wire reference to a [`QueueDirective`]
    QueueReference,
    "QueueReference"
);

typed_reference!(
    /// Wire reference to a [`ListDirective`]
    ListReference,
    "ListReference"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NotClone;

    #[test]
    fn references_do_not_require_payload_traits() {
        let reference = QueueReference::<NotClone>::new(DirectiveKey::from("q"));
        let copy = reference.clone();
        assert_eq!(reference, copy);
        assert_eq!(format!("{copy:?}"), "QueueReference { key: DirectiveKey(\"q\") }");
    }

    #[test]
    fn reference_points_at_directive_key() {
        let directive = ListDirective::new(vec![1, 2, 3]);
        assert_eq!(directive.to_reference().key(), directive.key());

        let directive = SingleUseDirective::new("v");
        assert_eq!(directive.to_reference().key(), directive.key());
    }

    #[test]
    fn reference_serializes_as_key_only() {
        let reference = SingleUseReference::<u32>::new(DirectiveKey::from("k1"));
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, r#"{"key":"k1"}"#);

        let back: SingleUseReference<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
    }

    #[test]
    fn directive_key_covers_every_shape() {
        let key = DirectiveKey::from("same");
        let shapes: Vec<Directive<u8>> = vec![
            DescriptiveDirective::with_key(key.clone()).into(),
            SingleUseDirective::with_key(key.clone(), 1).into(),
            QueueDirective::with_key(key.clone(), [1, 2]).into(),
            ListDirective::with_key(key.clone(), [3]).into(),
        ];
        assert!(shapes.iter().all(|d| d.key() == &key));
    }
}
