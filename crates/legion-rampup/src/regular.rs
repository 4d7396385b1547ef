//! Constant batches at a constant pace

use crate::error::{require_positive, RampUpError};
use crate::line::MinionsStartingLine;
use crate::strategy::{scale_period, RampUpStrategy, RampUpStrategyIterator};

/// Starts `minions_count_pro_launch` minions every `period_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularRampUp {
    period_ms: u64,
    minions_count_pro_launch: u32,
}

impl RegularRampUp {
    /// Create new regular strategy
    ///
    /// # Errors
    /// [`RampUpError::InvalidParameter`] when the period or batch size is zero.
    pub fn new(period_ms: u64, minions_count_pro_launch: u32) -> Result<Self, RampUpError> {
        require_positive("period_ms", period_ms)?;
        require_positive("minions_count_pro_launch", u64::from(minions_count_pro_launch))?;
        Ok(Self {
            period_ms,
            minions_count_pro_launch,
        })
    }
}

impl RampUpStrategy for RegularRampUp {
    fn iterator(&self, total_minions_count: u32, speed_factor: f64) -> Box<dyn RampUpStrategyIterator> {
        Box::new(RegularIterator {
            period_ms: scale_period(self.period_ms, speed_factor),
            minions_count_pro_launch: self.minions_count_pro_launch,
            remaining: total_minions_count,
        })
    }

    fn name(&self) -> &'static str {
        "regular"
    }
}

struct RegularIterator {
    period_ms: u64,
    minions_count_pro_launch: u32,
    remaining: u32,
}

impl RampUpStrategyIterator for RegularIterator {
    fn next(&mut self) -> MinionsStartingLine {
        let count = self.minions_count_pro_launch.min(self.remaining);
        self.remaining -= count;
        MinionsStartingLine::new(count, self.period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_lines_with_truncated_tail() {
        let strategy = RegularRampUp::new(500, 3).unwrap();
        let mut iterator = strategy.iterator(7, 1.0);

        assert_eq!(iterator.next(), MinionsStartingLine::new(3, 500));
        assert_eq!(iterator.next(), MinionsStartingLine::new(3, 500));
        assert_eq!(iterator.next(), MinionsStartingLine::new(1, 500));
    }

    #[test]
    fn test_speed_factor_never_produces_zero_offset() {
        let strategy = RegularRampUp::new(1, 3).unwrap();
        let mut iterator = strategy.iterator(3, 1_000.0);

        assert_eq!(iterator.next().offset_ms, 1);
    }
}
