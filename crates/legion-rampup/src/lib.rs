//! Legion ramp-up strategies
//!
//! A ramp-up decides when, and how many, minions of a scenario start. Given
//! the total minion count and a speed factor, a [`RampUpStrategy`] yields a
//! [`RampUpStrategyIterator`] producing [`MinionsStartingLine`]s: "start
//! `count` minions `offset_ms` after the previous line".
//!
//! # Strategies
//!
//! - [`RegularRampUp`]: constant batches at a constant pace
//! - [`AcceleratingRampUp`]: constant batches, shrinking delays
//! - [`ProgressiveVolumeRampUp`]: growing batches, constant delay
//! - [`TimeFrameRampUp`]: equal batches spread over a fixed time frame
//! - [`UserDefinedRampUp`]: any function of elapsed time and total count
//!
//! Every line has `count > 0` and `offset_ms > 0` as long as minions remain,
//! and no line ever claims more minions than remain.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod accelerating;
mod configuration;
mod error;
mod line;
mod progressive_volume;
mod regular;
mod strategy;
mod time_frame;
mod user_defined;

pub use accelerating::AcceleratingRampUp;
pub use configuration::RampUpConfiguration;
pub use error::RampUpError;
pub use line::MinionsStartingLine;
pub use progressive_volume::ProgressiveVolumeRampUp;
pub use regular::RegularRampUp;
pub use strategy::{RampUpStrategy, RampUpStrategyIterator};
pub use time_frame::TimeFrameRampUp;
pub use user_defined::{StartingLineFn, UserDefinedRampUp};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
