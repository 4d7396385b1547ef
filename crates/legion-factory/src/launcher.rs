//! Head-side issuing of the coordination directives

use crate::config::RampUpDefaults;
use crate::directives::{DirectiveProducer, FactoryDirective};
use legion_directive::{DirectiveError, DirectiveKey, DirectiveRegistry, SingleUseDirective};
use std::sync::Arc;
use tracing::info;

/// Issues the directives driving the scenarios of a campaign
#[derive(Debug, Clone)]
pub struct CampaignLauncher {
    registry: DirectiveRegistry,
    directives: Arc<dyn DirectiveProducer>,
    defaults: RampUpDefaults,
}

impl CampaignLauncher {
    /// Create new launcher
    ///
    /// Payloads are saved into `registry`, which must be the one the
    /// factories read from.
    #[must_use]
    pub fn new(registry: DirectiveRegistry, directives: Arc<dyn DirectiveProducer>, defaults: RampUpDefaults) -> Self {
        Self {
            registry,
            directives,
            defaults,
        }
    }

    /// Ask the factories to create `minions_count` minions for a scenario
    ///
    /// # Errors
    /// Propagates the failure of the directive transport.
    pub async fn prepare_minions(
        &self,
        campaign: &str,
        scenario: &str,
        minions_count: u32,
    ) -> Result<DirectiveKey, DirectiveError> {
        let count = SingleUseDirective::new(minions_count);
        let reference = count.to_reference();
        self.registry.save(count).await;

        let key = reference.key().clone();
        self.directives
            .publish(FactoryDirective::MinionsCreationPreparation {
                minions_count: reference,
                campaign: campaign.to_owned(),
                scenario: scenario.to_owned(),
            })
            .await?;
        info!(campaign, scenario, minions_count, %key, "minions creation requested");
        Ok(key)
    }

    /// Ask the factories to plan the starts of the created minions
    ///
    /// # Errors
    /// Propagates the failure of the directive transport.
    pub async fn start_ramp_up(&self, campaign: &str, scenario: &str) -> Result<DirectiveKey, DirectiveError> {
        let key = DirectiveKey::generate();
        self.directives
            .publish(FactoryDirective::MinionsRampUpPreparation {
                key: key.clone(),
                campaign: campaign.to_owned(),
                scenario: scenario.to_owned(),
                start_offset_ms: self.defaults.start_offset_ms,
                speed_factor: self.defaults.speed_factor,
            })
            .await?;
        info!(
            campaign,
            scenario,
            start_offset_ms = self.defaults.start_offset_ms,
            speed_factor = self.defaults.speed_factor,
            %key,
            "ramp-up requested"
        );
        Ok(key)
    }
}
