//! Constant batch size, geometrically shrinking delays

use crate::error::{require_finite_at_least, require_positive, RampUpError};
use crate::line::MinionsStartingLine;
use crate::strategy::{RampUpStrategy, RampUpStrategyIterator};

/// Starts `minions_count_pro_launch` minions per line, dividing the delay
/// between lines by `accelerator * speed_factor` until it reaches
/// `min_period_ms`
#[derive(Debug, Clone, PartialEq)]
pub struct AcceleratingRampUp {
    start_period_ms: u64,
    accelerator: f64,
    min_period_ms: u64,
    minions_count_pro_launch: u32,
}

impl AcceleratingRampUp {
    /// Create new accelerating strategy
    ///
    /// # Errors
    /// [`RampUpError::InvalidParameter`] when a period or the batch size is
    /// zero, or the accelerator is not finite and strictly positive.
    pub fn new(
        start_period_ms: u64,
        accelerator: f64,
        min_period_ms: u64,
        minions_count_pro_launch: u32,
    ) -> Result<Self, RampUpError> {
        require_positive("start_period_ms", start_period_ms)?;
        require_positive("min_period_ms", min_period_ms)?;
        require_positive("minions_count_pro_launch", u64::from(minions_count_pro_launch))?;
        require_finite_at_least("accelerator", accelerator, f64::MIN_POSITIVE)?;

        Ok(Self {
            start_period_ms,
            accelerator,
            min_period_ms,
            minions_count_pro_launch,
        })
    }
}

impl RampUpStrategy for AcceleratingRampUp {
    fn iterator(&self, total_minions_count: u32, speed_factor: f64) -> Box<dyn RampUpStrategyIterator> {
        Box::new(AcceleratingIterator {
            next_period_ms: self.start_period_ms,
            divisor: self.accelerator * speed_factor,
            min_period_ms: self.min_period_ms,
            minions_count_pro_launch: self.minions_count_pro_launch,
            remaining: total_minions_count,
        })
    }

    fn name(&self) -> &'static str {
        "accelerating"
    }
}

struct AcceleratingIterator {
    next_period_ms: u64,
    divisor: f64,
    min_period_ms: u64,
    minions_count_pro_launch: u32,
    remaining: u32,
}

impl RampUpStrategyIterator for AcceleratingIterator {
    fn next(&mut self) -> MinionsStartingLine {
        let count = self.minions_count_pro_launch.min(self.remaining);
        let line = MinionsStartingLine::new(count, self.next_period_ms);

        self.remaining -= count;
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let accelerated = (self.next_period_ms as f64 / self.divisor) as u64;
        self.next_period_ms = accelerated.max(self.min_period_ms);

        line
    }
}
