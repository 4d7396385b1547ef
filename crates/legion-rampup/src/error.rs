//! Ramp-up error types

use thiserror::Error;

/// Errors raised while building or running a ramp-up
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RampUpError {
    /// A strategy was configured with an unusable parameter
    #[error("invalid ramp-up parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A strategy produced a line with a non-positive count or offset
    #[error("invalid starting line: {0}")]
    InvalidStartingLine(String),

    /// The speed factor must be positive and finite
    #[error("invalid speed factor {0}: must be positive and finite")]
    InvalidSpeedFactor(f64),
}

impl RampUpError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub(crate) fn require_positive(name: &'static str, value: u64) -> Result<(), RampUpError> {
    if value == 0 {
        return Err(RampUpError::parameter(name, "must be greater than 0"));
    }
    Ok(())
}

pub(crate) fn require_finite_at_least(name: &'static str, value: f64, min: f64) -> Result<(), RampUpError> {
    if !value.is_finite() || value < min {
        return Err(RampUpError::parameter(
            name,
            format!("must be finite and at least {min}, got {value}"),
        ));
    }
    Ok(())
}
