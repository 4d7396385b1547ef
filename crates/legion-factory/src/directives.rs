//! Directives exchanged between the head and the factories
//!
//! Only references and routing metadata travel in a [`FactoryDirective`];
//! the payloads stay in the registry of the node that saved them.

use crate::types::{CampaignKey, DagId, MinionId, MinionStartDefinition, ScenarioName};
use async_trait::async_trait;
use legion_directive::{DirectiveError, DirectiveKey, ListReference, QueueReference, SingleUseReference};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio::sync::mpsc;

/// Wire form of the coordination directives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactoryDirective {
    /// Create the minions of a scenario; the count is a single-use value
    MinionsCreationPreparation {
        /// Minion count
        minions_count: SingleUseReference<u32>,
        /// Campaign
        campaign: CampaignKey,
        /// Scenario
        scenario: ScenarioName,
    },
    /// Materialize the queued minions of one DAG
    MinionsCreation {
        /// Minion identifiers to create
        queue: QueueReference<MinionId>,
        /// Campaign
        campaign: CampaignKey,
        /// Scenario
        scenario: ScenarioName,
        /// DAG the minions execute
        dag: DagId,
    },
    /// Compute the start instants of the created minions
    MinionsRampUpPreparation {
        /// Directive key
        key: DirectiveKey,
        /// Campaign
        campaign: CampaignKey,
        /// Scenario
        scenario: ScenarioName,
        /// Delay before the first start, absorbing propagation latency
        start_offset_ms: u64,
        /// Ramp-up speed factor
        speed_factor: f64,
    },
    /// Schedule the minion starts
    MinionsStart {
        /// Start definitions
        starts: ListReference<MinionStartDefinition>,
        /// Campaign
        campaign: CampaignKey,
        /// Scenario
        scenario: ScenarioName,
    },
}

impl FactoryDirective {
    /// Key that feedback about this directive refers to
    #[must_use]
    pub fn key(&self) -> &DirectiveKey {
        match self {
            Self::MinionsCreationPreparation { minions_count, .. } => minions_count.key(),
            Self::MinionsCreation { queue, .. } => queue.key(),
            Self::MinionsRampUpPreparation { key, .. } => key,
            Self::MinionsStart { starts, .. } => starts.key(),
        }
    }

    /// Campaign the directive belongs to
    #[must_use]
    pub fn campaign(&self) -> &CampaignKey {
        match self {
            Self::MinionsCreationPreparation { campaign, .. }
            | Self::MinionsCreation { campaign, .. }
            | Self::MinionsRampUpPreparation { campaign, .. }
            | Self::MinionsStart { campaign, .. } => campaign,
        }
    }

    /// Scenario the directive belongs to
    #[must_use]
    pub fn scenario(&self) -> &ScenarioName {
        match self {
            Self::MinionsCreationPreparation { scenario, .. }
            | Self::MinionsCreation { scenario, .. }
            | Self::MinionsRampUpPreparation { scenario, .. }
            | Self::MinionsStart { scenario, .. } => scenario,
        }
    }

    /// Short name of the directive kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MinionsCreationPreparation { .. } => "minions-creation-preparation",
            Self::MinionsCreation { .. } => "minions-creation",
            Self::MinionsRampUpPreparation { .. } => "minions-ramp-up-preparation",
            Self::MinionsStart { .. } => "minions-start",
        }
    }
}

/// Outbound channel for directives
#[async_trait]
pub trait DirectiveProducer: Send + Sync + Debug {
    /// Publish one directive
    async fn publish(&self, directive: FactoryDirective) -> Result<(), DirectiveError>;
}

/// In-process [`DirectiveProducer`] backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelDirectiveProducer {
    sender: mpsc::UnboundedSender<FactoryDirective>,
}

impl ChannelDirectiveProducer {
    /// Create new producer and the receiver draining it
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FactoryDirective>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DirectiveProducer for ChannelDirectiveProducer {
    async fn publish(&self, directive: FactoryDirective) -> Result<(), DirectiveError> {
        self.sender
            .send(directive)
            .map_err(|e| DirectiveError::TransportClosed(format!("{} directive {}", e.0.kind(), e.0.key())))
    }
}
