use legion_rampup::{
    AcceleratingRampUp, MinionsStartingLine, ProgressiveVolumeRampUp, RampUpStrategy, RegularRampUp,
    TimeFrameRampUp, UserDefinedRampUp,
};
use proptest::prelude::*;

/// Drive an iterator the way the ramp-up preparation does, with a safety cap
fn drive(strategy: &dyn RampUpStrategy, total: u32, speed_factor: f64) -> Vec<MinionsStartingLine> {
    let mut iterator = strategy.iterator(total, speed_factor);
    let mut remaining = total;
    let mut lines = Vec::new();
    while remaining > 0 && lines.len() <= total as usize {
        let line = iterator.next();
        assert!(line.count <= remaining, "{line} claims more than {remaining} remaining");
        remaining -= line.count;
        lines.push(line);
    }
    lines
}

fn assert_budget(lines: &[MinionsStartingLine], total: u32) {
    assert!(lines.iter().all(MinionsStartingLine::is_valid), "invalid line in {lines:?}");
    assert_eq!(lines.iter().map(|l| l.count).sum::<u32>(), total);
}

#[test]
fn test_accelerating_reference_case() {
    let strategy = AcceleratingRampUp::new(1000, 2.0, 100, 5).unwrap();
    let lines = drive(&strategy, 23, 1.0);

    assert_budget(&lines, 23);
    assert!(lines.windows(2).all(|w| w[0].offset_ms >= w[1].offset_ms));
    assert!(lines.iter().all(|l| l.offset_ms >= 100));
}

#[test]
fn test_iterators_are_independent() {
    let strategy = RegularRampUp::new(100, 2).unwrap();
    let mut first = strategy.iterator(4, 1.0);
    let mut second = strategy.iterator(4, 1.0);

    first.next();
    first.next();
    assert_eq!(second.next().count, 2);
}

proptest! {
    #[test]
    fn prop_accelerating_spends_budget(
        total in 1..2_000u32,
        start_period in 1..10_000u64,
        accelerator in 1.0..8.0f64,
        min_period in 1..500u64,
        per_launch in 1..50u32,
        speed_factor in 0.1..10.0f64,
    ) {
        let strategy = AcceleratingRampUp::new(start_period, accelerator, min_period, per_launch).unwrap();
        let lines = drive(&strategy, total, speed_factor);

        assert_budget(&lines, total);
        prop_assert!(lines.iter().skip(1).all(|l| l.offset_ms >= min_period));
    }

    #[test]
    fn prop_progressive_volume_spends_budget(
        total in 1..2_000u32,
        period in 1..5_000u64,
        at_start in 1..20u32,
        multiplier in 1.0..4.0f64,
        max in 1..200u32,
        speed_factor in 0.1..10.0f64,
    ) {
        let strategy = ProgressiveVolumeRampUp::new(period, at_start, multiplier, max).unwrap();
        let lines = drive(&strategy, total, speed_factor);

        assert_budget(&lines, total);
        prop_assert!(lines.iter().all(|l| l.count <= max));
    }

    #[test]
    fn prop_regular_spends_budget(
        total in 1..2_000u32,
        period in 1..5_000u64,
        per_launch in 1..100u32,
        speed_factor in 0.1..10.0f64,
    ) {
        let strategy = RegularRampUp::new(period, per_launch).unwrap();
        let lines = drive(&strategy, total, speed_factor);

        assert_budget(&lines, total);
        prop_assert_eq!(lines.len(), total.div_ceil(per_launch) as usize);
    }

    #[test]
    fn prop_time_frame_spends_budget(
        total in 1..2_000u32,
        period in 1..2_000u64,
        periods in 1..40u64,
        extra in 0..2_000u64,
        speed_factor in 0.1..10.0f64,
    ) {
        let time_frame = period * periods + extra % period;
        let strategy = TimeFrameRampUp::new(period, time_frame).unwrap();
        let lines = drive(&strategy, total, speed_factor);

        assert_budget(&lines, total);
        prop_assert!(lines.len() as u64 <= periods);
        prop_assert!(lines.iter().all(|l| l.offset_ms == lines[0].offset_ms));
    }

    #[test]
    fn prop_user_defined_never_overshoots(
        total in 1..1_000u32,
        count in 1..300u32,
        offset in 1..1_000u64,
    ) {
        let strategy = UserDefinedRampUp::new(move |_, _| MinionsStartingLine::new(count, offset));
        let lines = drive(&strategy, total, 1.0);

        assert_budget(&lines, total);
        prop_assert!(lines.iter().all(|l| l.offset_ms == offset));
    }
}
