//! Constant delay, geometrically growing batches

use crate::error::{require_finite_at_least, require_positive, RampUpError};
use crate::line::MinionsStartingLine;
use crate::strategy::{scale_period, RampUpStrategy, RampUpStrategyIterator};

/// Starts batches every `period_ms`, multiplying the batch size by
/// `multiplier` after each line
///
/// The batch size is capped by `max_minions_count_pro_launch` and by the
/// minions still remaining once the current batch is subtracted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressiveVolumeRampUp {
    period_ms: u64,
    minions_count_pro_launch_at_start: u32,
    multiplier: f64,
    max_minions_count_pro_launch: u32,
}

impl ProgressiveVolumeRampUp {
    /// Create new progressive volume strategy
    ///
    /// # Errors
    /// [`RampUpError::InvalidParameter`] when the period or a batch size is
    /// zero, or the multiplier is below 1.
    pub fn new(
        period_ms: u64,
        minions_count_pro_launch_at_start: u32,
        multiplier: f64,
        max_minions_count_pro_launch: u32,
    ) -> Result<Self, RampUpError> {
        require_positive("period_ms", period_ms)?;
        require_positive(
            "minions_count_pro_launch_at_start",
            u64::from(minions_count_pro_launch_at_start),
        )?;
        require_positive("max_minions_count_pro_launch", u64::from(max_minions_count_pro_launch))?;
        require_finite_at_least("multiplier", multiplier, 1.0)?;

        Ok(Self {
            period_ms,
            minions_count_pro_launch_at_start,
            multiplier,
            max_minions_count_pro_launch,
        })
    }
}

impl RampUpStrategy for ProgressiveVolumeRampUp {
    fn iterator(&self, total_minions_count: u32, speed_factor: f64) -> Box<dyn RampUpStrategyIterator> {
        Box::new(ProgressiveVolumeIterator {
            period_ms: scale_period(self.period_ms, speed_factor),
            volume: self.minions_count_pro_launch_at_start,
            multiplier: self.multiplier,
            max: self.max_minions_count_pro_launch,
            remaining: total_minions_count,
        })
    }

    fn name(&self) -> &'static str {
        "progressive-volume"
    }
}

struct ProgressiveVolumeIterator {
    period_ms: u64,
    volume: u32,
    multiplier: f64,
    max: u32,
    remaining: u32,
}

impl RampUpStrategyIterator for ProgressiveVolumeIterator {
    fn next(&mut self) -> MinionsStartingLine {
        let count = self.volume.min(self.max).min(self.remaining);
        self.remaining -= count;

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let grown = (f64::from(self.volume) * self.multiplier).floor().min(f64::from(u32::MAX)) as u32;
        self.volume = grown.max(1).min(self.max).min(self.remaining);

        MinionsStartingLine::new(count, self.period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_volume_grows_then_caps() {
        let strategy = ProgressiveVolumeRampUp::new(200, 2, 2.0, 10).unwrap();
        let mut iterator = strategy.iterator(40, 1.0);

        let counts: Vec<u32> = (0..6).map(|_| iterator.next().count).collect();
        assert_eq!(counts, vec![2, 4, 8, 10, 10, 6]);
    }

    #[test]
    fn test_period_is_divided_by_speed_factor() {
        let strategy = ProgressiveVolumeRampUp::new(200, 2, 2.0, 10).unwrap();
        let mut iterator = strategy.iterator(40, 4.0);

        assert_eq!(iterator.next(), MinionsStartingLine::new(2, 50));
    }

    #[test]
    fn test_next_volume_is_capped_by_remaining_after_emission() {
        let strategy = ProgressiveVolumeRampUp::new(100, 3, 3.0, 100).unwrap();
        let mut iterator = strategy.iterator(5, 1.0);

        assert_eq!(iterator.next().count, 3);
        assert_eq!(iterator.next().count, 2);
    }

    #[test]
    fn test_rejects_shrinking_multiplier() {
        assert!(ProgressiveVolumeRampUp::new(100, 3, 0.5, 100).is_err());
        assert!(ProgressiveVolumeRampUp::new(0, 3, 2.0, 100).is_err());
    }
}
