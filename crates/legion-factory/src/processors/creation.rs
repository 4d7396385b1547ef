use super::{report_failure, DirectiveProcessor};
use crate::assignment::MinionAssignmentKeeper;
use crate::directives::FactoryDirective;
use crate::error::ProcessingError;
use crate::runtime::MinionRuntime;
use crate::scenario::ScenarioRegistry;
use crate::types::{CampaignKey, DagId, MinionId, ScenarioName};
use async_trait::async_trait;
use legion_directive::{DirectiveRegistry, FeedbackProducer, QueueReference};
use std::sync::Arc;
use tracing::debug;

/// Pops the minions of a creation queue and materializes them
///
/// Progress feedback of the queue comes from the registry itself; only a
/// failure is reported here.
#[derive(Debug)]
pub struct MinionsCreationProcessor {
    registry: DirectiveRegistry,
    scenarios: Arc<dyn ScenarioRegistry>,
    runtime: Arc<dyn MinionRuntime>,
    keeper: Arc<MinionAssignmentKeeper>,
    feedback: Arc<dyn FeedbackProducer>,
}

impl MinionsCreationProcessor {
    /// Create new processor
    #[must_use]
    pub fn new(
        registry: DirectiveRegistry,
        scenarios: Arc<dyn ScenarioRegistry>,
        runtime: Arc<dyn MinionRuntime>,
        keeper: Arc<MinionAssignmentKeeper>,
        feedback: Arc<dyn FeedbackProducer>,
    ) -> Self {
        Self {
            registry,
            scenarios,
            runtime,
            keeper,
            feedback,
        }
    }

    async fn create_all(
        &self,
        queue: &QueueReference<MinionId>,
        campaign: &CampaignKey,
        scenario: &ScenarioName,
        dag: &DagId,
    ) -> Result<usize, ProcessingError> {
        let under_load = self
            .scenarios
            .scenario(scenario)
            .and_then(|definition| definition.dag(dag).map(|d| d.is_distributed()))
            .ok_or_else(|| ProcessingError::UnknownScenario(scenario.clone()))?;
        let dags = [dag.clone()];

        let mut created = 0;
        while let Some(minion) = self.registry.pop(queue).await {
            self.runtime.create(campaign, scenario, dag, &minion).await?;
            self.keeper
                .register_minions_to_assign(campaign, scenario, &dags, std::slice::from_ref(&minion), under_load)
                .await;
            created += 1;
        }
        Ok(created)
    }
}

#[async_trait]
impl DirectiveProcessor for MinionsCreationProcessor {
    fn name(&self) -> &'static str {
        "minions-creation"
    }

    fn accept(&self, directive: &FactoryDirective) -> bool {
        matches!(
            directive,
            FactoryDirective::MinionsCreation { scenario, dag, .. } if self.scenarios.has_dag(scenario, dag)
        )
    }

    async fn process(&self, directive: &FactoryDirective) -> Result<(), ProcessingError> {
        let FactoryDirective::MinionsCreation {
            queue,
            campaign,
            scenario,
            dag,
        } = directive
        else {
            return Ok(());
        };

        match self.create_all(queue, campaign, scenario, dag).await {
            Ok(created) => {
                debug!(%campaign, %scenario, %dag, created, "minions created");
                Ok(())
            }
            Err(e) => {
                report_failure(self.feedback.as_ref(), self.name(), directive.key(), &e).await;
                Err(e)
            }
        }
    }
}
