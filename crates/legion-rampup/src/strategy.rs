//! Ramp-up strategy traits

use crate::line::MinionsStartingLine;
use std::fmt::Debug;

/// Pacing algorithm turning a minion count into starting lines
///
/// Strategies are immutable and may be shared across scenarios and threads;
/// every call to [`iterator`](RampUpStrategy::iterator) yields an independent
/// iterator owning all the mutable state of one ramp-up.
pub trait RampUpStrategy: Send + Sync + Debug {
    /// Create the iterator for `total_minions_count` minions
    ///
    /// A `speed_factor` above 1 shortens the delays, below 1 stretches them.
    fn iterator(&self, total_minions_count: u32, speed_factor: f64) -> Box<dyn RampUpStrategyIterator>;

    /// Strategy name (for logging/serialization)
    fn name(&self) -> &'static str;
}

/// Stateful cursor over the starting lines of one ramp-up
///
/// The caller keeps track of the remaining budget and stops calling
/// [`next`](RampUpStrategyIterator::next) once every minion is placed. A line
/// never claims more minions than remain.
pub trait RampUpStrategyIterator: Send {
    /// Compute the next starting line
    fn next(&mut self) -> MinionsStartingLine;
}

pub(crate) fn scale_period(period_ms: u64, speed_factor: f64) -> u64 {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = (period_ms as f64 / speed_factor) as u64;
    scaled.max(1)
}
