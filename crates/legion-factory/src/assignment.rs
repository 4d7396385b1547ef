//! Minion assignment and completion tracking
//!
//! The keeper records which DAGs every minion of a scenario must execute and
//! aggregates completion bottom-up: a minion completes when its DAG countdown
//! reaches zero, a scenario when its last minion under load completes, and a
//! campaign when its last scenario completes.
//!
//! Locking is split in two levels:
//!
//! - one async exclusive section per (campaign, scenario), held across the
//!   whole check-and-update of a notification;
//! - one short synchronous section per campaign, guarding the scenario table
//!   and the singleton minions. It is only taken inside a scenario section,
//!   never the other way round.
//!
//! Completed scenarios and campaigns are marked closed before they are
//! dropped from their tables, so a late registration racing with the
//! completion retries on a fresh entry instead of resurrecting a closed one.

use crate::error::AssignmentError;
use crate::types::{CampaignCompletionState, CampaignKey, DagId, MinionId, ScenarioName};
use dashmap::DashMap;
use legion_rampup::MinionsStartingLine;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Start offsets of the minions under load, grouped by offset
pub type SchedulePlan = BTreeMap<u64, Vec<MinionId>>;

/// Tracks assignments and cascades completions of the local minions
#[derive(Debug, Default)]
pub struct MinionAssignmentKeeper {
    campaigns: DashMap<CampaignKey, Arc<CampaignAssignments>>,
}

#[derive(Debug, Default)]
struct CampaignAssignments {
    state: parking_lot::Mutex<CampaignState>,
}

#[derive(Debug, Default)]
struct CampaignState {
    scenarios: HashMap<ScenarioName, Arc<tokio::sync::Mutex<ScenarioAssignments>>>,
    singletons: HashMap<MinionId, SingletonAssignment>,
    closed: bool,
}

#[derive(Debug)]
struct SingletonAssignment {
    scenario: ScenarioName,
    dags: Vec<DagId>,
}

#[derive(Debug, Default)]
struct ScenarioAssignments {
    /// DAG count each minion was scheduled for, restored on restart
    scheduled: HashMap<MinionId, usize>,
    /// DAGs left before each minion completes
    remaining: HashMap<MinionId, usize>,
    dags: HashMap<MinionId, Vec<DagId>>,
    /// Registration order of the minions under load
    order: Vec<MinionId>,
    live: HashSet<MinionId>,
    plan: SchedulePlan,
    closed: bool,
}

impl CampaignAssignments {
    fn scenario(&self, scenario: &str) -> Option<Arc<tokio::sync::Mutex<ScenarioAssignments>>> {
        self.state.lock().scenarios.get(scenario).cloned()
    }
}

impl MinionAssignmentKeeper {
    /// Create new empty keeper
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register minions and the DAGs they have to execute
    ///
    /// Minions under load join the live set of the scenario and their DAG
    /// countdown grows by `dag_ids.len()`, so a minion may be registered once
    /// per DAG. Other minions are singletons of the campaign.
    pub async fn register_minions_to_assign(
        &self,
        campaign: &str,
        scenario: &str,
        dag_ids: &[DagId],
        minion_ids: &[MinionId],
        under_load: bool,
    ) {
        loop {
            let assignments = self.campaign_or_insert(campaign);

            let scenario_lock = {
                let mut state = assignments.state.lock();
                if !state.closed && !under_load {
                    for minion in minion_ids {
                        state
                            .singletons
                            .entry(minion.clone())
                            .or_insert_with(|| SingletonAssignment {
                                scenario: scenario.to_owned(),
                                dags: Vec::new(),
                            })
                            .dags
                            .extend(dag_ids.iter().cloned());
                    }
                    debug!(campaign, scenario, count = minion_ids.len(), "singleton minions registered");
                    return;
                }
                let open = !state.closed;
                open.then(|| Arc::clone(state.scenarios.entry(scenario.to_owned()).or_default()))
            };
            let Some(scenario_lock) = scenario_lock else {
                trace!(campaign, scenario, "campaign closed during registration, retrying");
                tokio::task::yield_now().await;
                continue;
            };

            let mut assignments = scenario_lock.lock().await;
            if assignments.closed {
                drop(assignments);
                trace!(campaign, scenario, "scenario closed during registration, retrying");
                tokio::task::yield_now().await;
                continue;
            }
            for minion in minion_ids {
                assignments.register(minion, dag_ids);
            }
            debug!(
                campaign,
                scenario,
                count = minion_ids.len(),
                dags = dag_ids.len(),
                "minions under load registered"
            );
            return;
        }
    }

    /// Record that a minion completed some DAGs and cascade the completion
    ///
    /// Equivalent to [`execution_complete_with_restart`](Self::execution_complete_with_restart)
    /// for a minion that will not restart.
    pub async fn execution_complete(
        &self,
        campaign: &str,
        scenario: &str,
        minion: &str,
        completed_dag_ids: &[DagId],
    ) -> CampaignCompletionState {
        self.execution_complete_with_restart(campaign, scenario, minion, completed_dag_ids, false)
            .await
    }

    /// Record that a minion completed some DAGs and cascade the completion
    ///
    /// When the countdown reaches zero and `might_restart` is set, only the
    /// minion completion is reported and its countdown is reset to the number
    /// of DAGs it was scheduled for. A singleton minion is dropped from the
    /// campaign on its first completion. Unknown campaigns, scenarios or
    /// minions yield an all-false state.
    pub async fn execution_complete_with_restart(
        &self,
        campaign: &str,
        scenario: &str,
        minion: &str,
        completed_dag_ids: &[DagId],
        might_restart: bool,
    ) -> CampaignCompletionState {
        let Some(assignments) = self.campaigns.get(campaign).map(|e| Arc::clone(e.value())) else {
            debug!(campaign, scenario, minion, "completion for an unknown campaign");
            return CampaignCompletionState::default();
        };

        let scenario_lock = {
            let mut state = assignments.state.lock();
            if state.singletons.remove(minion).is_some() {
                trace!(campaign, scenario, minion, "singleton minion complete");
                return CampaignCompletionState::minion();
            }
            state.scenarios.get(scenario).cloned()
        };
        let Some(scenario_lock) = scenario_lock else {
            debug!(campaign, scenario, minion, "completion for an unknown scenario");
            return CampaignCompletionState::default();
        };

        let mut scenario_assignments = scenario_lock.lock().await;
        if scenario_assignments.closed {
            debug!(campaign, scenario, minion, "completion for a closed scenario");
            return CampaignCompletionState::default();
        }

        let Some(remaining) = scenario_assignments.remaining.get_mut(minion) else {
            debug!(campaign, scenario, minion, "completion for an unknown minion");
            return CampaignCompletionState::default();
        };
        *remaining = remaining.saturating_sub(completed_dag_ids.len());
        if *remaining > 0 {
            trace!(campaign, scenario, minion, remaining = *remaining, "minion still has DAGs to run");
            return CampaignCompletionState::default();
        }

        if might_restart {
            let scheduled = scenario_assignments.scheduled.get(minion).copied().unwrap_or_default();
            scenario_assignments.remaining.insert(minion.to_owned(), scheduled);
            trace!(campaign, scenario, minion, scheduled, "minion complete, countdown reset for restart");
            return CampaignCompletionState::minion();
        }

        scenario_assignments.remaining.remove(minion);
        scenario_assignments.live.remove(minion);
        let mut completion = CampaignCompletionState::minion();
        trace!(campaign, scenario, minion, live = scenario_assignments.live.len(), "minion complete");
        if !scenario_assignments.live.is_empty() {
            return completion;
        }

        scenario_assignments.closed = true;
        completion.scenario_complete = true;
        info!(campaign, scenario, "scenario complete");

        let mut state = assignments.state.lock();
        state.scenarios.remove(scenario);
        if state.scenarios.is_empty() {
            state.closed = true;
            self.campaigns
                .remove_if(campaign, |_, current| Arc::ptr_eq(current, &assignments));
            completion.campaign_complete = true;
            info!(campaign, "campaign complete");
        }
        completion
    }

    /// Identifiers of the minions under load, in registration order
    pub async fn ids_of_minions_under_load(&self, campaign: &str, scenario: &str) -> Vec<MinionId> {
        match self.scenario(campaign, scenario) {
            Some(lock) => lock.lock().await.order.clone(),
            None => Vec::new(),
        }
    }

    /// Number of minions under load registered for the scenario
    pub async fn count_minions_under_load(&self, campaign: &str, scenario: &str) -> usize {
        match self.scenario(campaign, scenario) {
            Some(lock) => lock.lock().await.order.len(),
            None => 0,
        }
    }

    /// DAGs assigned to every minion of the scenario, singletons included
    pub async fn assignments(&self, campaign: &str, scenario: &str) -> HashMap<MinionId, Vec<DagId>> {
        let Some(assignments) = self.campaigns.get(campaign).map(|e| Arc::clone(e.value())) else {
            return HashMap::new();
        };

        let (scenario_lock, mut all) = {
            let state = assignments.state.lock();
            let singletons: HashMap<_, _> = state
                .singletons
                .iter()
                .filter(|(_, singleton)| singleton.scenario == scenario)
                .map(|(minion, singleton)| (minion.clone(), singleton.dags.clone()))
                .collect();
            (state.scenarios.get(scenario).cloned(), singletons)
        };

        if let Some(lock) = scenario_lock {
            all.extend(lock.lock().await.dags.iter().map(|(m, d)| (m.clone(), d.clone())));
        }
        all
    }

    /// Distribute the minions under load over the offsets of starting lines
    ///
    /// Minions are taken in registration order; each line takes at most
    /// `count` of them at its `offset_ms`. Lines sharing an offset share an
    /// entry of the plan.
    ///
    /// # Errors
    /// [`AssignmentError::UnknownScenario`] when nothing is registered under
    /// load for the scenario, [`AssignmentError::Unscheduled`] when the lines
    /// do not cover every minion. The plan is left untouched on error.
    pub async fn schedule(
        &self,
        campaign: &str,
        scenario: &str,
        starting_lines: &[MinionsStartingLine],
    ) -> Result<(), AssignmentError> {
        let lock = self
            .scenario(campaign, scenario)
            .ok_or_else(|| AssignmentError::UnknownScenario {
                campaign: campaign.to_owned(),
                scenario: scenario.to_owned(),
            })?;
        let mut assignments = lock.lock().await;

        let mut plan = SchedulePlan::new();
        let mut minions = assignments.order.iter();
        for line in starting_lines {
            let batch: Vec<_> = minions.by_ref().take(line.count as usize).cloned().collect();
            if batch.is_empty() {
                continue;
            }
            plan.entry(line.offset_ms).or_default().extend(batch);
        }

        let unscheduled = minions.count();
        if unscheduled > 0 {
            return Err(AssignmentError::Unscheduled(unscheduled));
        }

        debug!(campaign, scenario, offsets = plan.len(), "minions under load scheduled");
        assignments.plan = plan;
        Ok(())
    }

    /// Schedule plan of the scenario, empty when not scheduled
    pub async fn read_schedule_plan(&self, campaign: &str, scenario: &str) -> SchedulePlan {
        match self.scenario(campaign, scenario) {
            Some(lock) => lock.lock().await.plan.clone(),
            None => SchedulePlan::new(),
        }
    }

    /// Whether the campaign still has registered assignments
    #[must_use]
    pub fn is_tracking(&self, campaign: &str) -> bool {
        self.campaigns.contains_key(campaign)
    }

    fn campaign_or_insert(&self, campaign: &str) -> Arc<CampaignAssignments> {
        Arc::clone(self.campaigns.entry(campaign.to_owned()).or_default().value())
    }

    fn scenario(&self, campaign: &str, scenario: &str) -> Option<Arc<tokio::sync::Mutex<ScenarioAssignments>>> {
        self.campaigns.get(campaign).map(|e| Arc::clone(e.value()))?.scenario(scenario)
    }
}

impl ScenarioAssignments {
    fn register(&mut self, minion: &MinionId, dag_ids: &[DagId]) {
        *self.scheduled.entry(minion.clone()).or_default() += dag_ids.len();
        *self.remaining.entry(minion.clone()).or_default() += dag_ids.len();

        let dags = self.dags.entry(minion.clone()).or_default();
        if dags.is_empty() && !self.live.contains(minion) {
            self.order.push(minion.clone());
        }
        dags.extend(dag_ids.iter().cloned());
        self.live.insert(minion.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    const NONE: CampaignCompletionState = CampaignCompletionState {
        minion_complete: false,
        scenario_complete: false,
        campaign_complete: false,
    };

    #[tokio::test]
    async fn test_cascade_minion_scenario_campaign() {
        let keeper = MinionAssignmentKeeper::new();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1", "d2"]), &ids(&["m1", "m2"]), true)
            .await;

        assert_eq!(keeper.execution_complete("c", "s", "m1", &ids(&["d1"])).await, NONE);
        assert_eq!(
            keeper.execution_complete("c", "s", "m1", &ids(&["d2"])).await,
            CampaignCompletionState::minion()
        );
        assert_eq!(
            keeper.execution_complete("c", "s", "m2", &ids(&["d1", "d2"])).await,
            CampaignCompletionState {
                minion_complete: true,
                scenario_complete: true,
                campaign_complete: true,
            }
        );
        assert!(!keeper.is_tracking("c"));
    }

    #[tokio::test]
    async fn test_unknown_identifiers_yield_nothing() {
        let keeper = MinionAssignmentKeeper::new();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &ids(&["m1"]), true)
            .await;

        assert_eq!(keeper.execution_complete("x", "s", "m1", &ids(&["d1"])).await, NONE);
        assert_eq!(keeper.execution_complete("c", "x", "m1", &ids(&["d1"])).await, NONE);
        assert_eq!(keeper.execution_complete("c", "s", "x", &ids(&["d1"])).await, NONE);
    }

    #[tokio::test]
    async fn test_singleton_completes_alone() {
        let keeper = MinionAssignmentKeeper::new();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &ids(&["m1"]), true)
            .await;
        keeper
            .register_minions_to_assign("c", "s", &ids(&["singleton-dag"]), &ids(&["single"]), false)
            .await;

        assert_eq!(
            keeper.execution_complete("c", "s", "single", &ids(&["singleton-dag"])).await,
            CampaignCompletionState::minion()
        );
        assert!(keeper.is_tracking("c"));
        assert!(!keeper.assignments("c", "s").await.contains_key("single"));
    }

    #[tokio::test]
    async fn test_singleton_completes_only_once() {
        let keeper = MinionAssignmentKeeper::new();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &ids(&["m1"]), true)
            .await;
        keeper
            .register_minions_to_assign("c", "s", &ids(&["singleton-dag"]), &ids(&["single"]), false)
            .await;

        let first = keeper.execution_complete("c", "s", "single", &ids(&["singleton-dag"])).await;
        let second = keeper.execution_complete("c", "s", "single", &ids(&["singleton-dag"])).await;

        assert_eq!(first, CampaignCompletionState::minion());
        assert_eq!(second, NONE);
    }

    #[tokio::test]
    async fn test_restart_resets_countdown_without_cascade() {
        let keeper = MinionAssignmentKeeper::new();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1", "d2"]), &ids(&["m1"]), true)
            .await;

        assert_eq!(
            keeper
                .execution_complete_with_restart("c", "s", "m1", &ids(&["d1", "d2"]), true)
                .await,
            CampaignCompletionState::minion()
        );
        assert_eq!(
            keeper
                .execution_complete_with_restart("c", "s", "m1", &ids(&["d1"]), true)
                .await,
            NONE
        );
        let last = keeper.execution_complete("c", "s", "m1", &ids(&["d2"])).await;
        assert!(last.minion_complete && last.scenario_complete && last.campaign_complete);
    }

    #[tokio::test]
    async fn test_minion_registered_per_dag_accumulates_countdown() {
        let keeper = MinionAssignmentKeeper::new();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &ids(&["m1", "m2"]), true)
            .await;
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d2"]), &ids(&["m1", "m2"]), true)
            .await;

        assert_eq!(keeper.ids_of_minions_under_load("c", "s").await, ids(&["m1", "m2"]));
        assert_eq!(keeper.count_minions_under_load("c", "s").await, 2);
        assert_eq!(keeper.assignments("c", "s").await["m1"], ids(&["d1", "d2"]));
        assert_eq!(keeper.execution_complete("c", "s", "m1", &ids(&["d1"])).await, NONE);
    }

    #[tokio::test]
    async fn test_completed_campaign_accepts_new_registrations() {
        let keeper = MinionAssignmentKeeper::new();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &ids(&["m1"]), true)
            .await;
        assert!(keeper.execution_complete("c", "s", "m1", &ids(&["d1"])).await.campaign_complete);

        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &ids(&["m2"]), true)
            .await;
        assert_eq!(keeper.ids_of_minions_under_load("c", "s").await, ids(&["m2"]));
    }

    #[tokio::test]
    async fn test_schedule_groups_minions_by_offset() {
        let keeper = MinionAssignmentKeeper::new();
        let minions: Vec<String> = (1..=10).map(|i| format!("m{i}")).collect();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &minions, true)
            .await;

        keeper
            .schedule(
                "c",
                "s",
                &[
                    MinionsStartingLine::new(3, 100),
                    MinionsStartingLine::new(2, 200),
                    MinionsStartingLine::new(1, 200),
                    MinionsStartingLine::new(50, 300),
                ],
            )
            .await
            .unwrap();

        let plan = keeper.read_schedule_plan("c", "s").await;
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[&100], ids(&["m1", "m2", "m3"]));
        assert_eq!(plan[&200], ids(&["m4", "m5", "m6"]));
        assert_eq!(plan[&300].len(), 4);
    }

    #[tokio::test]
    async fn test_schedule_reports_uncovered_minions() {
        let keeper = MinionAssignmentKeeper::new();
        let minions: Vec<String> = (0..1000).map(|i| format!("m{i}")).collect();
        keeper
            .register_minions_to_assign("c", "s", &ids(&["d1"]), &minions, true)
            .await;

        let error = keeper
            .schedule("c", "s", &[MinionsStartingLine::new(1, 123)])
            .await
            .unwrap_err();
        assert_eq!(error, AssignmentError::Unscheduled(999));
        assert_eq!(error.to_string(), "999 minions could not be scheduled");
        assert!(keeper.read_schedule_plan("c", "s").await.is_empty());
    }
}
