//! Interface to the component materializing and running minions

use crate::error::RuntimeError;
use crate::types::{CampaignKey, DagId, MinionId, MinionStartDefinition, ScenarioName};
use async_trait::async_trait;
use std::fmt::Debug;

/// Local minion runtime driven by the directive processors
#[async_trait]
pub trait MinionRuntime: Send + Sync + Debug {
    /// Materialize a minion for one DAG of a scenario
    async fn create(
        &self,
        campaign: &CampaignKey,
        scenario: &ScenarioName,
        dag: &DagId,
        minion: &MinionId,
    ) -> Result<(), RuntimeError>;

    /// Schedule the first execution of a minion
    async fn schedule_start(
        &self,
        campaign: &CampaignKey,
        scenario: &ScenarioName,
        start: &MinionStartDefinition,
    ) -> Result<(), RuntimeError>;
}
