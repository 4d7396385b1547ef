//! Testing utilities for the Legion workspace
//!
//! Recording collaborators, scenario fixtures and wiring helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use legion_directive::{
    DirectiveError, DirectiveFeedback, DirectiveKey, DirectiveRegistry, FeedbackProducer, FeedbackStatus,
    IdGenerator, RegistryConfig,
};
use legion_factory::{
    CampaignKey, CreatedMinions, DagDefinition, DagId, DirectiveProducer, FactoryDirective, FactoryServices,
    InMemoryScenarioRegistry, MinionAssignmentKeeper, MinionId, MinionRuntime, MinionStartDefinition,
    RuntimeError, ScenarioDefinition, ScenarioName,
};
use legion_rampup::{RampUpStrategy, RegularRampUp};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Install a test subscriber honoring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default)]
pub struct RecordingFeedbackProducer {
    published: Mutex<Vec<DirectiveFeedback>>,
}

impl RecordingFeedbackProducer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<DirectiveFeedback> {
        self.published.lock().clone()
    }

    /// Statuses published for one directive, in publication order
    pub fn statuses_for(&self, key: &DirectiveKey) -> Vec<FeedbackStatus> {
        self.published
            .lock()
            .iter()
            .filter(|f| &f.directive_key == key)
            .map(|f| f.status)
            .collect()
    }

    pub fn errors_for(&self, key: &DirectiveKey) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .filter(|f| &f.directive_key == key)
            .filter_map(|f| f.error.clone())
            .collect()
    }
}

#[async_trait]
impl FeedbackProducer for RecordingFeedbackProducer {
    async fn publish(&self, feedback: DirectiveFeedback) -> Result<(), DirectiveError> {
        self.published.lock().push(feedback);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingDirectiveProducer {
    published: Mutex<Vec<FactoryDirective>>,
}

impl RecordingDirectiveProducer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<FactoryDirective> {
        self.published.lock().clone()
    }

    pub fn take(&self) -> Vec<FactoryDirective> {
        std::mem::take(&mut *self.published.lock())
    }
}

#[async_trait]
impl DirectiveProducer for RecordingDirectiveProducer {
    async fn publish(&self, directive: FactoryDirective) -> Result<(), DirectiveError> {
        self.published.lock().push(directive);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMinion {
    pub campaign: CampaignKey,
    pub scenario: ScenarioName,
    pub dag: DagId,
    pub minion: MinionId,
}

/// Runtime recording every call, optionally failing for chosen minions
#[derive(Debug, Default)]
pub struct RecordingRuntime {
    created: Mutex<Vec<CreatedMinion>>,
    starts: Mutex<Vec<MinionStartDefinition>>,
    failing: Mutex<HashSet<MinionId>>,
}

impl RecordingRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, minion: impl Into<MinionId>) {
        self.failing.lock().insert(minion.into());
    }

    pub fn created(&self) -> Vec<CreatedMinion> {
        self.created.lock().clone()
    }

    pub fn starts(&self) -> Vec<MinionStartDefinition> {
        self.starts.lock().clone()
    }
}

#[async_trait]
impl MinionRuntime for RecordingRuntime {
    async fn create(
        &self,
        campaign: &CampaignKey,
        scenario: &ScenarioName,
        dag: &DagId,
        minion: &MinionId,
    ) -> Result<(), RuntimeError> {
        if self.failing.lock().contains(minion) {
            return Err(RuntimeError::Creation {
                minion: minion.clone(),
                reason: "injected failure".to_owned(),
            });
        }
        self.created.lock().push(CreatedMinion {
            campaign: campaign.clone(),
            scenario: scenario.clone(),
            dag: dag.clone(),
            minion: minion.clone(),
        });
        Ok(())
    }

    async fn schedule_start(
        &self,
        _campaign: &CampaignKey,
        _scenario: &ScenarioName,
        start: &MinionStartDefinition,
    ) -> Result<(), RuntimeError> {
        if self.failing.lock().contains(&start.minion_id) {
            return Err(RuntimeError::Scheduling {
                minion: start.minion_id.clone(),
                reason: "injected failure".to_owned(),
            });
        }
        self.starts.lock().push(start.clone());
        Ok(())
    }
}

/// Deterministic identifiers `<prefix>-0`, `<prefix>-1`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        })
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        format!("{}-{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Scenario with one distributed DAG, one singleton DAG and one background DAG
pub fn mixed_scenario(name: &str, minions_count: u32, ramp_up: Arc<dyn RampUpStrategy>) -> ScenarioDefinition {
    ScenarioDefinition::new(name, minions_count, ramp_up)
        .with_dag(DagDefinition::under_load("dag-under-load"))
        .with_dag(DagDefinition::singleton("dag-singleton"))
        .with_dag(DagDefinition::background("dag-background"))
}

pub fn regular_ramp_up(period_ms: u64, per_launch: u32) -> Arc<dyn RampUpStrategy> {
    match RegularRampUp::new(period_ms, per_launch) {
        Ok(strategy) => Arc::new(strategy),
        Err(e) => panic!("invalid fixture ramp-up: {e}"),
    }
}

/// Fully wired factory with recording collaborators
pub struct TestFactory {
    pub services: FactoryServices,
    pub feedback: Arc<RecordingFeedbackProducer>,
    pub directives: Arc<RecordingDirectiveProducer>,
    pub runtime: Arc<RecordingRuntime>,
    pub scenarios: Arc<InMemoryScenarioRegistry>,
}

impl TestFactory {
    pub fn new() -> Self {
        Self::with_registry_config(RegistryConfig::default())
    }

    pub fn with_registry_config(config: RegistryConfig) -> Self {
        let feedback = RecordingFeedbackProducer::new();
        let directives = RecordingDirectiveProducer::new();
        let runtime = RecordingRuntime::new();
        let scenarios = Arc::new(InMemoryScenarioRegistry::new());

        let services = FactoryServices {
            registry: DirectiveRegistry::with_config(config, Arc::clone(&feedback) as Arc<dyn FeedbackProducer>),
            feedback: Arc::clone(&feedback) as Arc<dyn FeedbackProducer>,
            directives: Arc::clone(&directives) as Arc<dyn DirectiveProducer>,
            scenarios: Arc::clone(&scenarios) as Arc<dyn legion_factory::ScenarioRegistry>,
            runtime: Arc::clone(&runtime) as Arc<dyn MinionRuntime>,
            keeper: Arc::new(MinionAssignmentKeeper::new()),
            created_minions: Arc::new(CreatedMinions::new()),
            id_generator: SequentialIdGenerator::new("minion"),
        };

        Self {
            services,
            feedback,
            directives,
            runtime,
            scenarios,
        }
    }

    pub fn registry(&self) -> &DirectiveRegistry {
        &self.services.registry
    }
}

impl Default for TestFactory {
    fn default() -> Self {
        Self::new()
    }
}
