//! Equal batches spread over a fixed time frame

use crate::error::{require_positive, RampUpError};
use crate::line::MinionsStartingLine;
use crate::strategy::{scale_period, RampUpStrategy, RampUpStrategyIterator};

/// Starts every minion within `time_frame_ms`, one batch every `period_ms`
///
/// The frame holds `time_frame_ms / period_ms` launches and the minions are
/// shared evenly between them, the last batch taking what is left. The speed
/// factor shortens the period, so the whole frame shrinks with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFrameRampUp {
    period_ms: u64,
    time_frame_ms: u64,
}

impl TimeFrameRampUp {
    /// Create new time frame strategy
    ///
    /// # Errors
    /// [`RampUpError::InvalidParameter`] when the period or the frame is zero,
    /// or when the frame is shorter than a single period.
    pub fn new(period_ms: u64, time_frame_ms: u64) -> Result<Self, RampUpError> {
        require_positive("period_ms", period_ms)?;
        require_positive("time_frame_ms", time_frame_ms)?;
        if time_frame_ms < period_ms {
            return Err(RampUpError::parameter(
                "time_frame_ms",
                format!("must be at least the period ({period_ms} ms), got {time_frame_ms}"),
            ));
        }
        Ok(Self {
            period_ms,
            time_frame_ms,
        })
    }

    fn launches(&self) -> u64 {
        (self.time_frame_ms / self.period_ms).max(1)
    }
}

impl RampUpStrategy for TimeFrameRampUp {
    fn iterator(&self, total_minions_count: u32, speed_factor: f64) -> Box<dyn RampUpStrategyIterator> {
        let per_launch = u64::from(total_minions_count).div_ceil(self.launches()).max(1);
        Box::new(TimeFrameIterator {
            period_ms: scale_period(self.period_ms, speed_factor),
            minions_count_pro_launch: u32::try_from(per_launch).unwrap_or(u32::MAX),
            remaining: total_minions_count,
        })
    }

    fn name(&self) -> &'static str {
        "time-frame"
    }
}

struct TimeFrameIterator {
    period_ms: u64,
    minions_count_pro_launch: u32,
    remaining: u32,
}

impl RampUpStrategyIterator for TimeFrameIterator {
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
    fn test_shares_minions_between_launches() {
        let strategy = TimeFrameRampUp::new(100, 1000).unwrap();
        let mut iterator = strategy.iterator(95, 1.0);

        for _ in 0..9 {
            assert_eq!(iterator.next(), MinionsStartingLine::new(10, 100));
        }
        assert_eq!(iterator.next(), MinionsStartingLine::new(5, 100));
    }

    #[test]
    fn test_fewer_minions_than_launches() {
        let strategy = TimeFrameRampUp::new(100, 1000).unwrap();
        let mut iterator = strategy.iterator(3, 2.0);

        assert_eq!(iterator.next(), MinionsStartingLine::new(1, 50));
        assert_eq!(iterator.next(), MinionsStartingLine::new(1, 50));
        assert_eq!(iterator.next(), MinionsStartingLine::new(1, 50));
    }

    #[test]
    fn test_frame_of_a_single_period_starts_everything_at_once() {
        let strategy = TimeFrameRampUp::new(764, 1000).unwrap();
        let mut iterator = strategy.iterator(42, 1.0);

        assert_eq!(iterator.next(), MinionsStartingLine::new(42, 764));
    }

    #[test]
    fn test_rejects_unusable_parameters() {
        assert!(matches!(
            TimeFrameRampUp::new(0, 1000),
            Err(RampUpError::InvalidParameter { name: "period_ms", .. })
        ));
        assert!(matches!(
            TimeFrameRampUp::new(100, 0),
            Err(RampUpError::InvalidParameter { name: "time_frame_ms", .. })
        ));
        assert!(matches!(
            TimeFrameRampUp::new(764, 564),
            Err(RampUpError::InvalidParameter { name: "time_frame_ms", .. })
        ));
    }
}
