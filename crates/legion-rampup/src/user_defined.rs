//! Ramp-up delegated to a caller-supplied function

use crate::line::MinionsStartingLine;
use crate::strategy::{RampUpStrategy, RampUpStrategyIterator};
use std::fmt;
use std::sync::Arc;

/// Signature of a user-defined pacing function
///
/// Receives the milliseconds elapsed since the first line (sum of the
/// offsets emitted so far) and the total minion count.
pub type StartingLineFn = dyn Fn(u64, u32) -> MinionsStartingLine + Send + Sync;

/// Strategy delegating every line to a function
///
/// The returned count is clamped to the remaining minions; the offset is
/// used as returned.
#[derive(Clone)]
pub struct UserDefinedRampUp {
    specification: Arc<StartingLineFn>,
}

impl UserDefinedRampUp {
    /// Create new user-defined strategy
    pub fn new<F>(specification: F) -> Self
    where
        F: Fn(u64, u32) -> MinionsStartingLine + Send + Sync + 'static,
    {
        Self {
            specification: Arc::new(specification),
        }
    }
}

impl fmt::Debug for UserDefinedRampUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDefinedRampUp").finish_non_exhaustive()
    }
}

impl RampUpStrategy for UserDefinedRampUp {
    fn iterator(&self, total_minions_count: u32, _speed_factor: f64) -> Box<dyn RampUpStrategyIterator> {
        Box::new(UserDefinedIterator {
            specification: Arc::clone(&self.specification),
            total: total_minions_count,
            remaining: total_minions_count,
            elapsed_ms: 0,
        })
    }

    fn name(&self) -> &'static str {
        "user-defined"
    }
}

struct UserDefinedIterator {
    specification: Arc<StartingLineFn>,
    total: u32,
    remaining: u32,
    elapsed_ms: u64,
}

impl RampUpStrategyIterator for UserDefinedIterator {
    fn next(&mut self) -> MinionsStartingLine {
        let requested = (self.specification)(self.elapsed_ms, self.total);
        let count = requested.count.min(self.remaining);

        self.remaining -= count;
        self.elapsed_ms = self.elapsed_ms.saturating_add(requested.offset_ms);
        MinionsStartingLine::new(count, requested.offset_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_count_is_clamped_offset_is_kept() {
        let strategy = UserDefinedRampUp::new(|_, _| MinionsStartingLine::new(10, 42));
        let mut iterator = strategy.iterator(15, 3.0);

        assert_eq!(iterator.next(), MinionsStartingLine::new(10, 42));
        assert_eq!(iterator.next(), MinionsStartingLine::new(5, 42));
    }

    #[test]
    fn test_function_sees_elapsed_time_and_total() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let strategy = UserDefinedRampUp::new(move |elapsed, total| {
            record.lock().unwrap().push((elapsed, total));
            MinionsStartingLine::new(1, 100)
        });

        let mut iterator = strategy.iterator(3, 1.0);
        for _ in 0..3 {
            iterator.next();
        }

        assert_eq!(*seen.lock().unwrap(), vec![(0, 3), (100, 3), (200, 3)]);
    }
}
