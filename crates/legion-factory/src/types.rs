//! Domain identifiers and records shared by the factory components

use serde::{Deserialize, Serialize};

/// Identifier of a campaign
pub type CampaignKey = String;

/// Name of a scenario
pub type ScenarioName = String;

/// Identifier of a DAG inside a scenario
pub type DagId = String;

/// Identifier of a minion
pub type MinionId = String;

/// When a minion starts its first execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinionStartDefinition {
    /// Minion to start
    pub minion_id: MinionId,
    /// Absolute start instant, epoch milliseconds
    pub timestamp_ms: i64,
}

impl MinionStartDefinition {
    /// Create new start definition
    #[inline]
    #[must_use]
    pub fn new(minion_id: impl Into<MinionId>, timestamp_ms: i64) -> Self {
        Self {
            minion_id: minion_id.into(),
            timestamp_ms,
        }
    }
}

/// Outcome of one completion notification
///
/// Produced fresh on every notification and never retained. Each flag is
/// true only when the notification completed that level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CampaignCompletionState {
    /// The minion has no DAG left to execute
    pub minion_complete: bool,
    /// The last minion under load of the scenario completed
    pub scenario_complete: bool,
    /// The last scenario of the campaign completed
    pub campaign_complete: bool,
}

impl CampaignCompletionState {
    /// State reporting only a minion completion
    #[inline]
    #[must_use]
    pub const fn minion() -> Self {
        Self {
            minion_complete: true,
            scenario_complete: false,
            campaign_complete: false,
        }
    }
}

/// Current time in epoch milliseconds
#[inline]
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
