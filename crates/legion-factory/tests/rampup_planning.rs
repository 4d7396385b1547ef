use legion_factory::plan_minion_starts;
use legion_rampup::{AcceleratingRampUp, ProgressiveVolumeRampUp, RampUpStrategy};
use proptest::prelude::*;

fn minions(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("minion-{i}")).collect()
}

fn assert_plan(strategy: &dyn RampUpStrategy, count: usize, speed_factor: f64, start_offset_ms: u64) {
    let now = 1_700_000_000_000;
    let ids = minions(count);
    let plan = plan_minion_starts(&ids, strategy, speed_factor, start_offset_ms, now).unwrap();

    let planned: Vec<_> = plan.iter().map(|s| s.minion_id.clone()).collect();
    assert_eq!(planned, ids);
    assert!(plan.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    if let Some(first) = plan.first() {
        assert!(first.timestamp_ms > now + i64::try_from(start_offset_ms).unwrap());
    }
}

proptest! {
    #[test]
    fn prop_accelerating_plan_keeps_creation_order(
        count in 0..500usize,
        per_launch in 1..40u32,
        speed_factor in 0.25..4.0f64,
        start_offset_ms in 0..10_000u64,
    ) {
        let strategy = AcceleratingRampUp::new(2_000, 1.5, 10, per_launch).unwrap();
        assert_plan(&strategy, count, speed_factor, start_offset_ms);
    }

    #[test]
    fn prop_progressive_volume_plan_keeps_creation_order(
        count in 0..500usize,
        at_start in 1..10u32,
        multiplier in 1.0..3.0f64,
        speed_factor in 0.25..4.0f64,
    ) {
        let strategy = ProgressiveVolumeRampUp::new(300, at_start, multiplier, 60).unwrap();
        assert_plan(&strategy, count, speed_factor, 500);
    }
}
