use super::{with_feedback, DirectiveProcessor};
use crate::directives::FactoryDirective;
use crate::error::ProcessingError;
use crate::runtime::MinionRuntime;
use crate::scenario::ScenarioRegistry;
use crate::types::{CampaignKey, MinionStartDefinition, ScenarioName};
use async_trait::async_trait;
use legion_directive::{DirectiveRegistry, FeedbackProducer, ListReference};
use std::sync::Arc;
use tracing::{debug, warn};

/// Schedules the starts listed in a start directive on the local runtime
#[derive(Debug)]
pub struct MinionsStartProcessor {
    registry: DirectiveRegistry,
    scenarios: Arc<dyn ScenarioRegistry>,
    runtime: Arc<dyn MinionRuntime>,
    feedback: Arc<dyn FeedbackProducer>,
}

impl MinionsStartProcessor {
    /// Create new processor
    #[must_use]
    pub fn new(
        registry: DirectiveRegistry,
        scenarios: Arc<dyn ScenarioRegistry>,
        runtime: Arc<dyn MinionRuntime>,
        feedback: Arc<dyn FeedbackProducer>,
    ) -> Self {
        Self {
            registry,
            scenarios,
            runtime,
            feedback,
        }
    }

    async fn schedule(
        &self,
        starts: &ListReference<MinionStartDefinition>,
        campaign: &CampaignKey,
        scenario: &ScenarioName,
    ) -> Result<(), ProcessingError> {
        let definitions = self.registry.list(starts).await;
        if definitions.is_empty() {
            warn!(%campaign, %scenario, key = %starts.key(), "no minion start to schedule");
        }
        for start in &definitions {
            self.runtime.schedule_start(campaign, scenario, start).await?;
        }
        debug!(%campaign, %scenario, scheduled = definitions.len(), "minion starts scheduled");
        Ok(())
    }
}

#[async_trait]
impl DirectiveProcessor for MinionsStartProcessor {
    fn name(&self) -> &'static str {
        "minions-start"
    }

    fn accept(&self, directive: &FactoryDirective) -> bool {
        matches!(
            directive,
            FactoryDirective::MinionsStart { scenario, .. } if self.scenarios.has_scenario(scenario)
        )
    }

    async fn process(&self, directive: &FactoryDirective) -> Result<(), ProcessingError> {
        let FactoryDirective::MinionsStart {
            starts,
            campaign,
            scenario,
        } = directive
        else {
            return Ok(());
        };

        with_feedback(
            self.feedback.as_ref(),
            self.name(),
            directive.key(),
            self.schedule(starts, campaign, scenario),
        )
        .await
    }
}
