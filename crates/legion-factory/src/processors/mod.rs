//! Directive processors of a factory
//!
//! Every processor decides on its own whether it handles a directive
//! ([`DirectiveProcessor::accept`]) and then executes it. Rejected
//! directives produce no feedback at all; accepted ones report
//! `IN_PROGRESS` followed by `COMPLETED` or `FAILED(message)`.

mod creation;
mod creation_preparation;
mod dispatcher;
mod rampup_preparation;
mod start;

pub use creation::MinionsCreationProcessor;
pub use creation_preparation::MinionsCreationPreparationProcessor;
pub use dispatcher::{DirectiveDispatcher, FactoryServices};
pub use rampup_preparation::{plan_minion_starts, starting_lines, MinionsRampUpPreparationProcessor};
pub use start::MinionsStartProcessor;

use crate::directives::FactoryDirective;
use crate::error::ProcessingError;
use crate::types::{CampaignKey, MinionId, ScenarioName};
use async_trait::async_trait;
use dashmap::DashMap;
use legion_directive::{DirectiveFeedback, DirectiveKey, FeedbackProducer};
use std::fmt::Debug;
use std::future::Future;
use tracing::{error, warn};

/// Handler of one kind of [`FactoryDirective`]
#[async_trait]
pub trait DirectiveProcessor: Send + Sync + Debug {
    /// Processor name (for logging)
    fn name(&self) -> &'static str;

    /// Whether this processor handles the directive on this factory
    fn accept(&self, directive: &FactoryDirective) -> bool;

    /// Execute an accepted directive
    async fn process(&self, directive: &FactoryDirective) -> Result<(), ProcessingError>;
}

/// Minions under load generated by the creation preparation, in creation
/// order, waiting for their ramp-up
#[derive(Debug, Default)]
pub struct CreatedMinions {
    minions: DashMap<(CampaignKey, ScenarioName), Vec<MinionId>>,
}

impl CreatedMinions {
    /// Create new empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the minions created for a scenario, replacing earlier ones
    pub fn record(&self, campaign: &str, scenario: &str, minions: Vec<MinionId>) {
        self.minions.insert((campaign.to_owned(), scenario.to_owned()), minions);
    }

    /// Whether minions were created for the scenario
    #[must_use]
    pub fn contains(&self, campaign: &str, scenario: &str) -> bool {
        self.minions.contains_key(&(campaign.to_owned(), scenario.to_owned()))
    }

    /// Minions created for the scenario, in creation order
    #[must_use]
    pub fn get(&self, campaign: &str, scenario: &str) -> Option<Vec<MinionId>> {
        self.minions
            .get(&(campaign.to_owned(), scenario.to_owned()))
            .map(|entry| entry.value().clone())
    }

    /// Forget the minions of the scenario once their ramp-up is prepared
    pub fn remove(&self, campaign: &str, scenario: &str) {
        self.minions.remove(&(campaign.to_owned(), scenario.to_owned()));
    }
}

/// Run `work` between `IN_PROGRESS` and `COMPLETED`/`FAILED` feedback
///
/// The error of a failed run is reported and then returned to the caller.
pub(crate) async fn with_feedback<Fut>(
    feedback: &dyn FeedbackProducer,
    processor: &'static str,
    key: &DirectiveKey,
    work: Fut,
) -> Result<(), ProcessingError>
where
    Fut: Future<Output = Result<(), ProcessingError>>,
{
    publish(feedback, DirectiveFeedback::in_progress(key.clone())).await;
    match work.await {
        Ok(()) => {
            publish(feedback, DirectiveFeedback::completed(key.clone())).await;
            Ok(())
        }
        Err(e) => {
            report_failure(feedback, processor, key, &e).await;
            Err(e)
        }
    }
}

pub(crate) async fn report_failure(
    feedback: &dyn FeedbackProducer,
    processor: &'static str,
    key: &DirectiveKey,
    e: &ProcessingError,
) {
    error!(processor, %key, error = %e, "directive processing failed");
    publish(feedback, DirectiveFeedback::failed(key.clone(), e.to_string())).await;
}

async fn publish(feedback: &dyn FeedbackProducer, notification: DirectiveFeedback) {
    let key = notification.directive_key.clone();
    if let Err(e) = feedback.publish(notification).await {
        warn!(%key, error = %e, "failed to publish directive feedback");
    }
}
