//! Scenarios known by a factory

use crate::types::{DagId, ScenarioName};
use dashmap::DashMap;
use legion_rampup::RampUpStrategy;
use std::fmt::Debug;
use std::sync::Arc;

/// DAG of a scenario as seen by the coordination core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagDefinition {
    /// DAG identifier
    pub id: DagId,
    /// Executed by every minion of the scenario
    pub under_load: bool,
    /// Executed once by a dedicated minion
    pub singleton: bool,
}

impl DagDefinition {
    /// DAG executed by every minion under load
    #[must_use]
    pub fn under_load(id: impl Into<DagId>) -> Self {
        Self {
            id: id.into(),
            under_load: true,
            singleton: false,
        }
    }

    /// DAG executed once by its own singleton minion
    #[must_use]
    pub fn singleton(id: impl Into<DagId>) -> Self {
        Self {
            id: id.into(),
            under_load: false,
            singleton: true,
        }
    }

    /// DAG outside of the load, executed by a single minion
    #[must_use]
    pub fn background(id: impl Into<DagId>) -> Self {
        Self {
            id: id.into(),
            under_load: false,
            singleton: false,
        }
    }

    /// Whether every minion of the scenario runs this DAG
    #[inline]
    #[must_use]
    pub fn is_distributed(&self) -> bool {
        self.under_load && !self.singleton
    }
}

/// Scenario with its minion count, ramp-up and DAGs
#[derive(Debug, Clone)]
pub struct ScenarioDefinition {
    /// Scenario name
    pub name: ScenarioName,
    /// Minions to create under load
    pub minions_count: u32,
    /// Pacing of the minion starts
    pub ramp_up: Arc<dyn RampUpStrategy>,
    /// DAGs of the scenario
    pub dags: Vec<DagDefinition>,
}

impl ScenarioDefinition {
    /// Create new scenario definition without DAGs
    #[must_use]
    pub fn new(name: impl Into<ScenarioName>, minions_count: u32, ramp_up: Arc<dyn RampUpStrategy>) -> Self {
        Self {
            name: name.into(),
            minions_count,
            ramp_up,
            dags: Vec::new(),
        }
    }

    /// Add a DAG
    #[must_use]
    pub fn with_dag(mut self, dag: DagDefinition) -> Self {
        self.dags.push(dag);
        self
    }

    /// Look a DAG up by identifier
    #[must_use]
    pub fn dag(&self, id: &str) -> Option<&DagDefinition> {
        self.dags.iter().find(|dag| dag.id == id)
    }
}

/// Lookup of the scenarios a factory can execute
pub trait ScenarioRegistry: Send + Sync + Debug {
    /// Whether the scenario is known
    fn has_scenario(&self, scenario: &str) -> bool;

    /// Whether the scenario is known and contains the DAG
    fn has_dag(&self, scenario: &str, dag: &str) -> bool;

    /// Definition of the scenario
    fn scenario(&self, scenario: &str) -> Option<Arc<ScenarioDefinition>>;
}

/// [`ScenarioRegistry`] kept in memory
#[derive(Debug, Default)]
pub struct InMemoryScenarioRegistry {
    scenarios: DashMap<ScenarioName, Arc<ScenarioDefinition>>,
}

impl InMemoryScenarioRegistry {
    /// Create new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a scenario
    pub fn register(&self, scenario: ScenarioDefinition) {
        tracing::debug!(scenario = %scenario.name, dags = scenario.dags.len(), "scenario registered");
        self.scenarios.insert(scenario.name.clone(), Arc::new(scenario));
    }
}

impl ScenarioRegistry for InMemoryScenarioRegistry {
    fn has_scenario(&self, scenario: &str) -> bool {
        self.scenarios.contains_key(scenario)
    }

    fn has_dag(&self, scenario: &str, dag: &str) -> bool {
        self.scenarios
            .get(scenario)
            .is_some_and(|definition| definition.dag(dag).is_some())
    }

    fn scenario(&self, scenario: &str) -> Option<Arc<ScenarioDefinition>> {
        self.scenarios.get(scenario).map(|entry| Arc::clone(entry.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legion_rampup::RegularRampUp;

    #[test]
    fn test_lookup_by_scenario_and_dag() {
        let registry = InMemoryScenarioRegistry::new();
        registry.register(
            ScenarioDefinition::new("s", 10, Arc::new(RegularRampUp::new(100, 1).unwrap()))
                .with_dag(DagDefinition::under_load("d1"))
                .with_dag(DagDefinition::singleton("d2")),
        );

        assert!(registry.has_scenario("s"));
        assert!(registry.has_dag("s", "d2"));
        assert!(!registry.has_dag("s", "d3"));
        assert!(!registry.has_dag("other", "d1"));
        assert_eq!(registry.scenario("s").unwrap().minions_count, 10);
    }

    #[test]
    fn test_only_under_load_non_singleton_dags_are_distributed() {
        assert!(DagDefinition::under_load("a").is_distributed());
        assert!(!DagDefinition::singleton("b").is_distributed());
        assert!(!DagDefinition::background("c").is_distributed());
    }
}
