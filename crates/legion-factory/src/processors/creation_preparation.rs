use super::{with_feedback, CreatedMinions, DirectiveProcessor};
use crate::directives::{DirectiveProducer, FactoryDirective};
use crate::error::ProcessingError;
use crate::scenario::ScenarioRegistry;
use crate::types::MinionId;
use async_trait::async_trait;
use legion_directive::{DirectiveRegistry, FeedbackProducer, IdGenerator, QueueDirective, SingleUseReference};
use std::sync::Arc;
use tracing::debug;

/// Turns a single-use minion count into one creation queue per DAG
///
/// Minions under load are generated once for the scenario and queued for
/// every distributed DAG; every other DAG gets one dedicated minion. No
/// creation is requested for a DAG left without minions.
#[derive(Debug)]
pub struct MinionsCreationPreparationProcessor {
    registry: DirectiveRegistry,
    scenarios: Arc<dyn ScenarioRegistry>,
    directives: Arc<dyn DirectiveProducer>,
    feedback: Arc<dyn FeedbackProducer>,
    id_generator: Arc<dyn IdGenerator>,
    created: Arc<CreatedMinions>,
}

impl MinionsCreationPreparationProcessor {
    /// Create new processor
    #[must_use]
    pub fn new(
        registry: DirectiveRegistry,
        scenarios: Arc<dyn ScenarioRegistry>,
        directives: Arc<dyn DirectiveProducer>,
        feedback: Arc<dyn FeedbackProducer>,
        id_generator: Arc<dyn IdGenerator>,
        created: Arc<CreatedMinions>,
    ) -> Self {
        Self {
            registry,
            scenarios,
            directives,
            feedback,
            id_generator,
            created,
        }
    }

    async fn prepare(
        &self,
        minions_count: &SingleUseReference<u32>,
        campaign: &str,
        scenario: &str,
    ) -> Result<(), ProcessingError> {
        let count = self
            .registry
            .read(minions_count)
            .await
            .ok_or_else(|| ProcessingError::MissingMinionsCount(minions_count.key().clone()))?;
        let definition = self
            .scenarios
            .scenario(scenario)
            .ok_or_else(|| ProcessingError::UnknownScenario(scenario.to_owned()))?;

        let minions_under_load: Vec<MinionId> = (0..count).map(|_| self.id_generator.generate()).collect();
        debug!(campaign, scenario, count, "minions under load generated");

        for dag in &definition.dags {
            let queue = if dag.is_distributed() {
                QueueDirective::new(minions_under_load.iter().cloned())
            } else {
                QueueDirective::new([self.id_generator.generate()])
            };
            if queue.is_empty() {
                debug!(campaign, scenario, dag = %dag.id, "no minion to create for the DAG");
                continue;
            }
            let reference = queue.to_reference();
            self.registry.save(queue).await;

            self.directives
                .publish(FactoryDirective::MinionsCreation {
                    queue: reference,
                    campaign: campaign.to_owned(),
                    scenario: scenario.to_owned(),
                    dag: dag.id.clone(),
                })
                .await?;
        }

        self.created.record(campaign, scenario, minions_under_load);
        Ok(())
    }
}

#[async_trait]
impl DirectiveProcessor for MinionsCreationPreparationProcessor {
    fn name(&self) -> &'static str {
        "minions-creation-preparation"
    }

    fn accept(&self, directive: &FactoryDirective) -> bool {
        matches!(
            directive,
            FactoryDirective::MinionsCreationPreparation { scenario, .. } if self.scenarios.has_scenario(scenario)
        )
    }

    async fn process(&self, directive: &FactoryDirective) -> Result<(), ProcessingError> {
        let FactoryDirective::MinionsCreationPreparation {
            minions_count,
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
            self.prepare(minions_count, campaign, scenario),
        )
        .await
    }
}
