//! Starting line produced by every ramp-up iteration

use serde::{Deserialize, Serialize};
use std::fmt;

/// "Start `count` minions `offset_ms` milliseconds after the previous line"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinionsStartingLine {
    /// Minions to start
    pub count: u32,
    /// Delay after the previous line, in milliseconds
    pub offset_ms: u64,
}

impl MinionsStartingLine {
    /// Create new starting line
    #[inline]
    #[must_use]
    pub const fn new(count: u32, offset_ms: u64) -> Self {
        Self { count, offset_ms }
    }

    /// Whether the line can be applied (`count > 0` and `offset_ms > 0`)
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.count > 0 && self.offset_ms > 0
    }
}

impl fmt::Display for MinionsStartingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minion(s) after {} ms", self.count, self.offset_ms)
    }
}
