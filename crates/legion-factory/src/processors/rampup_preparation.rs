use super::{with_feedback, CreatedMinions, DirectiveProcessor};
use crate::assignment::MinionAssignmentKeeper;
use crate::directives::{DirectiveProducer, FactoryDirective};
use crate::error::ProcessingError;
use crate::scenario::ScenarioRegistry;
use crate::types::{now_ms, MinionId, MinionStartDefinition};
use async_trait::async_trait;
use legion_directive::{DirectiveRegistry, FeedbackProducer, ListDirective};
use legion_rampup::{MinionsStartingLine, RampUpError, RampUpStrategy};
use std::sync::Arc;
use tracing::{debug, trace};

/// Drive a ramp-up until `total` minions are placed on starting lines
///
/// Every returned line has a positive count and offset, and the counts sum
/// up to `total`.
///
/// # Errors
/// [`RampUpError::InvalidSpeedFactor`] for a non-positive or non-finite
/// speed factor, [`RampUpError::InvalidStartingLine`] as soon as the
/// strategy yields a line with a zero count or offset.
pub fn starting_lines(
    strategy: &dyn RampUpStrategy,
    total: usize,
    speed_factor: f64,
) -> Result<Vec<MinionsStartingLine>, RampUpError> {
    if !speed_factor.is_finite() || speed_factor <= 0.0 {
        return Err(RampUpError::InvalidSpeedFactor(speed_factor));
    }
    let total = u32::try_from(total).map_err(|_| RampUpError::InvalidParameter {
        name: "minion_ids",
        reason: format!("{total} minions exceed the supported count"),
    })?;

    let mut iterator = strategy.iterator(total, speed_factor);
    let mut remaining = total;
    let mut lines = Vec::new();
    while remaining > 0 {
        let line = iterator.next();
        if !line.is_valid() {
            return Err(RampUpError::InvalidStartingLine(format!(
                "the count ({}) and the offset ({} ms) must both be positive",
                line.count, line.offset_ms
            )));
        }
        let count = line.count.min(remaining);
        remaining -= count;
        lines.push(MinionsStartingLine::new(count, line.offset_ms));
    }
    Ok(lines)
}

/// Compute the absolute start instant of every minion
///
/// The first line starts `start_offset_ms` after `now_ms` plus its own
/// offset; every following line starts its offset after the previous one.
/// Minions are assigned to the lines in the given order.
///
/// # Errors
/// As [`starting_lines`]. No partial plan is returned.
pub fn plan_minion_starts(
    minion_ids: &[MinionId],
    strategy: &dyn RampUpStrategy,
    speed_factor: f64,
    start_offset_ms: u64,
    now_ms: i64,
) -> Result<Vec<MinionStartDefinition>, RampUpError> {
    let lines = starting_lines(strategy, minion_ids.len(), speed_factor)?;
    Ok(assign_starts(minion_ids, &lines, start_offset_ms, now_ms))
}

fn assign_starts(
    minion_ids: &[MinionId],
    lines: &[MinionsStartingLine],
    start_offset_ms: u64,
    now_ms: i64,
) -> Vec<MinionStartDefinition> {
    let mut start = now_ms.saturating_add(millis(start_offset_ms));
    let mut starts = Vec::with_capacity(minion_ids.len());
    let mut pending = minion_ids.iter();

    for line in lines {
        start = start.saturating_add(millis(line.offset_ms));
        trace!(count = line.count, start, "starting line planned");
        starts.extend(
            pending
                .by_ref()
                .take(line.count as usize)
                .map(|minion| MinionStartDefinition::new(minion.clone(), start)),
        );
    }
    starts
}

fn millis(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Runs the ramp-up of the locally created minions, records the schedule
/// plan of the minions under load and publishes their start definitions
#[derive(Debug)]
pub struct MinionsRampUpPreparationProcessor {
    registry: DirectiveRegistry,
    scenarios: Arc<dyn ScenarioRegistry>,
    directives: Arc<dyn DirectiveProducer>,
    feedback: Arc<dyn FeedbackProducer>,
    keeper: Arc<MinionAssignmentKeeper>,
    created: Arc<CreatedMinions>,
}

impl MinionsRampUpPreparationProcessor {
    /// Create new processor
    #[must_use]
    pub fn new(
        registry: DirectiveRegistry,
        scenarios: Arc<dyn ScenarioRegistry>,
        directives: Arc<dyn DirectiveProducer>,
        feedback: Arc<dyn FeedbackProducer>,
        keeper: Arc<MinionAssignmentKeeper>,
        created: Arc<CreatedMinions>,
    ) -> Self {
        Self {
            registry,
            scenarios,
            directives,
            feedback,
            keeper,
            created,
        }
    }

    async fn prepare(
        &self,
        campaign: &str,
        scenario: &str,
        start_offset_ms: u64,
        speed_factor: f64,
    ) -> Result<(), ProcessingError> {
        let definition = self
            .scenarios
            .scenario(scenario)
            .ok_or_else(|| ProcessingError::UnknownScenario(scenario.to_owned()))?;
        let minions = self
            .created
            .get(campaign, scenario)
            .ok_or_else(|| ProcessingError::NoCreatedMinions {
                campaign: campaign.to_owned(),
                scenario: scenario.to_owned(),
            })?;

        let lines = starting_lines(definition.ramp_up.as_ref(), minions.len(), speed_factor)?;
        if !lines.is_empty() {
            self.keeper.schedule(campaign, scenario, &lines).await?;
        }
        let starts = assign_starts(&minions, &lines, start_offset_ms, now_ms());
        debug!(
            campaign,
            scenario,
            strategy = definition.ramp_up.name(),
            minions = starts.len(),
            "minion starts planned"
        );

        let list = ListDirective::new(starts);
        let reference = list.to_reference();
        self.registry.save(list).await;
        self.directives
            .publish(FactoryDirective::MinionsStart {
                starts: reference,
                campaign: campaign.to_owned(),
                scenario: scenario.to_owned(),
            })
            .await?;

        self.created.remove(campaign, scenario);
        Ok(())
    }
}

#[async_trait]
impl DirectiveProcessor for MinionsRampUpPreparationProcessor {
    fn name(&self) -> &'static str {
        "minions-ramp-up-preparation"
    }

    fn accept(&self, directive: &FactoryDirective) -> bool {
        matches!(
            directive,
            FactoryDirective::MinionsRampUpPreparation { campaign, scenario, .. }
                if self.scenarios.has_scenario(scenario) && self.created.contains(campaign, scenario)
        )
    }

    async fn process(&self, directive: &FactoryDirective) -> Result<(), ProcessingError> {
        let FactoryDirective::MinionsRampUpPreparation {
            key,
            campaign,
            scenario,
            start_offset_ms,
            speed_factor,
        } = directive
        else {
            return Ok(());
        };

        with_feedback(
            self.feedback.as_ref(),
            self.name(),
            key,
            self.prepare(campaign, scenario, *start_offset_ms, *speed_factor),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legion_rampup::{MinionsStartingLine, RegularRampUp, UserDefinedRampUp};
    use pretty_assertions::assert_eq;

    fn minions(count: usize) -> Vec<MinionId> {
        (0..count).map(|i| format!("minion-{i}")).collect()
    }

    #[test]
    fn test_starts_follow_lines_in_creation_order() {
        let strategy = UserDefinedRampUp::new(|_, _| MinionsStartingLine::new(3, 500));
        let now = 1_000_000;

        let starts = plan_minion_starts(&minions(28), &strategy, 2.0, 2000, now).unwrap();

        assert_eq!(starts.len(), 28);
        for (index, start) in starts.iter().enumerate() {
            let line = i64::try_from(index / 3 + 1).unwrap();
            assert_eq!(start.minion_id, format!("minion-{index}"));
            assert_eq!(start.timestamp_ms, now + 2000 + line * 500);
        }
        assert_eq!(starts[27].timestamp_ms, now + 2000 + 5000);
    }

    #[test]
    fn test_last_line_may_be_larger_than_remaining() {
        let strategy = RegularRampUp::new(100, 4).unwrap();

        let starts = plan_minion_starts(&minions(6), &strategy, 1.0, 0, 0).unwrap();
        let instants: Vec<i64> = starts.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(instants, vec![100, 100, 100, 100, 200, 200]);
    }

    #[test]
    fn test_zero_offset_line_is_rejected() {
        let strategy = UserDefinedRampUp::new(|_, _| MinionsStartingLine::new(3, 0));

        let error = plan_minion_starts(&minions(5), &strategy, 1.0, 0, 0).unwrap_err();
        assert!(matches!(error, RampUpError::InvalidStartingLine(_)));
    }

    #[test]
    fn test_zero_count_line_is_rejected() {
        let strategy = UserDefinedRampUp::new(|_, _| MinionsStartingLine::new(0, 100));

        let error = plan_minion_starts(&minions(5), &strategy, 1.0, 0, 0).unwrap_err();
        assert!(error.to_string().contains("count (0)"));
    }

    #[test]
    fn test_speed_factor_must_be_positive_and_finite() {
        let strategy = RegularRampUp::new(100, 4).unwrap();

        for speed_factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                plan_minion_starts(&minions(2), &strategy, speed_factor, 0, 0),
                Err(RampUpError::InvalidSpeedFactor(_))
            ));
        }
    }

    #[test]
    fn test_no_minion_gives_an_empty_plan() {
        let strategy = RegularRampUp::new(100, 4).unwrap();
        assert!(plan_minion_starts(&[], &strategy, 1.0, 0, 0).unwrap().is_empty());
    }
}
