//! Error types for the factory components

use crate::types::{CampaignKey, MinionId, ScenarioName};
use legion_directive::{DirectiveError, DirectiveKey};
use legion_rampup::RampUpError;
use thiserror::Error;

/// Failures of a [`MinionRuntime`](crate::MinionRuntime)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The minion could not be materialized
    #[error("minion {minion} could not be created: {reason}")]
    Creation {
        /// Minion concerned
        minion: MinionId,
        /// Failure cause
        reason: String,
    },

    /// The minion start could not be scheduled
    #[error("start of minion {minion} could not be scheduled: {reason}")]
    Scheduling {
        /// Minion concerned
        minion: MinionId,
        /// Failure cause
        reason: String,
    },
}

/// Failures of the [`MinionAssignmentKeeper`](crate::MinionAssignmentKeeper)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// No minion under load is registered for the scenario
    #[error("no minion under load is registered for scenario {scenario} of campaign {campaign}")]
    UnknownScenario {
        /// Campaign
        campaign: CampaignKey,
        /// Scenario
        scenario: ScenarioName,
    },

    /// The starting lines did not cover every minion under load
    #[error("{0} minions could not be scheduled")]
    Unscheduled(usize),
}

/// Failures while processing a directive
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The single-use minion count was already consumed or expired
    #[error("no minions count is available for directive {0}")]
    MissingMinionsCount(DirectiveKey),

    /// The scenario is not known by this factory
    #[error("scenario {0} is unknown")]
    UnknownScenario(ScenarioName),

    /// No minion was prepared locally for the scenario
    #[error("no minion was created for scenario {scenario} of campaign {campaign}")]
    NoCreatedMinions {
        /// Campaign
        campaign: CampaignKey,
        /// Scenario
        scenario: ScenarioName,
    },

    /// Ramp-up computation failed
    #[error(transparent)]
    RampUp(#[from] RampUpError),

    /// Publishing a directive failed
    #[error(transparent)]
    Directive(#[from] DirectiveError),

    /// The minion runtime failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Assignment bookkeeping failed
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

/// Failures while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`LegionConfig`](crate::LegionConfig)
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its accepted range
    #[error("invalid configuration value `{name}`: {reason}")]
    Invalid {
        /// Setting name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
