//! Declarative ramp-up configuration
//!
//! Lets scenarios describe their ramp-up in configuration files. User-defined
//! strategies cannot be expressed this way and are built in code.

use crate::accelerating::AcceleratingRampUp;
use crate::error::RampUpError;
use crate::progressive_volume::ProgressiveVolumeRampUp;
use crate::regular::RegularRampUp;
use crate::strategy::RampUpStrategy;
use crate::time_frame::TimeFrameRampUp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Serializable description of a built-in strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RampUpConfiguration {
    /// See [`RegularRampUp`]
    Regular {
        /// Delay between lines
        period_ms: u64,
        /// Minions per line
        minions_count_pro_launch: u32,
    },
    /// See [`AcceleratingRampUp`]
    Accelerating {
        /// Delay before the first line
        start_period_ms: u64,
        /// Divisor applied to the delay after each line
        accelerator: f64,
        /// Lower bound of the delay
        min_period_ms: u64,
        /// Minions per line
        minions_count_pro_launch: u32,
    },
    /// See [`ProgressiveVolumeRampUp`]
    ProgressiveVolume {
        /// Delay between lines
        period_ms: u64,
        /// Minions in the first line
        minions_count_pro_launch_at_start: u32,
        /// Growth factor of the batch size
        multiplier: f64,
        /// Upper bound of the batch size
        max_minions_count_pro_launch: u32,
    },
    /// See [`TimeFrameRampUp`]
    TimeFrame {
        /// Delay between lines
        period_ms: u64,
        /// Duration within which every minion starts
        time_frame_ms: u64,
    },
}

impl RampUpConfiguration {
    /// Build the described strategy
    ///
    /// # Errors
    /// Propagates the parameter validation of the strategy constructor.
    pub fn build(&self) -> Result<Arc<dyn RampUpStrategy>, RampUpError> {
        let strategy: Arc<dyn RampUpStrategy> = match *self {
            Self::Regular {
                period_ms,
                minions_count_pro_launch,
            } => Arc::new(RegularRampUp::new(period_ms, minions_count_pro_launch)?),
            Self::Accelerating {
                start_period_ms,
                accelerator,
                min_period_ms,
                minions_count_pro_launch,
            } => Arc::new(AcceleratingRampUp::new(
                start_period_ms,
                accelerator,
                min_period_ms,
                minions_count_pro_launch,
            )?),
            Self::ProgressiveVolume {
                period_ms,
                minions_count_pro_launch_at_start,
                multiplier,
                max_minions_count_pro_launch,
            } => Arc::new(ProgressiveVolumeRampUp::new(
                period_ms,
                minions_count_pro_launch_at_start,
                multiplier,
                max_minions_count_pro_launch,
            )?),
            Self::TimeFrame {
                period_ms,
                time_frame_ms,
            } => Arc::new(TimeFrameRampUp::new(period_ms, time_frame_ms)?),
        };
        tracing::debug!(strategy = strategy.name(), "ramp-up strategy built");
        Ok(strategy)
    }
}

impl TryFrom<&RampUpConfiguration> for Arc<dyn RampUpStrategy> {
    type Error = RampUpError;

    fn try_from(configuration: &RampUpConfiguration) -> Result<Self, Self::Error> {
        configuration.build()
    }
}
