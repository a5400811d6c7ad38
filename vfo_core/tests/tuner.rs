//! Behavioral tests for the ballistic step tuner.

use rstest::rstest;
use vfo_core::{StepLadder, Tuner, TunerCfg};

const START_HZ: f64 = 7_074_000.0;
const F_MIN_HZ: f64 = 7_000_000.0;
const F_MAX_HZ: f64 = 7_200_000.0;

fn default_tuner() -> Tuner {
    Tuner::new(TunerCfg::default(), StepLadder::default())
}

/// Drive one detent every `interval_ms` starting at `start_ms`, return the
/// tuner after `count` detents.
fn spin(tuner: &mut Tuner, start_ms: u64, interval_ms: u64, count: u64) -> u64 {
    let mut now = start_ms;
    for _ in 0..count {
        now += interval_ms;
        tuner.update(1, now);
    }
    now
}

#[rstest]
#[case(25, 9)]
#[case(40, 7)]
#[case(60, 6)]
#[case(100, 4)]
#[case(300, 1)]
#[case(600, 0)]
fn steady_spin_settles_on_the_expected_rung(#[case] interval_ms: u64, #[case] rung: usize) {
    let mut tuner = default_tuner();
    // The first detent carries an arbitrary long gap; the steady-state rung
    // is reached from the second onwards.
    spin(&mut tuner, 1_000, interval_ms, 8);
    assert_eq!(tuner.step_rung(), rung);
}

#[test]
fn rung_does_not_chatter_inside_the_hysteresis_band() {
    let mut tuner = default_tuner();
    let now = spin(&mut tuner, 1_000, 25, 4);
    assert_eq!(tuner.step_rung(), 9);

    // 40 ms sits between up_ms[9] = 28 (too slow to promote) and
    // down_ms[9] = 45 (too fast to demote): the rung must hold.
    spin(&mut tuner, now, 40, 10);
    assert_eq!(tuner.step_rung(), 9);

    // 50 ms crosses down_ms[9] and sheds exactly one rung.
    tuner.update(1, now + 400 + 50);
    assert_eq!(tuner.step_rung(), 8);
}

#[test]
fn pause_longer_than_idle_reset_collapses_to_the_finest_rung() {
    let mut tuner = default_tuner();
    let now = spin(&mut tuner, 1_000, 25, 6);
    assert_eq!(tuner.step_rung(), 9);

    // Inside the dwell threshold nothing happens.
    tuner.update(0, now + 150);
    assert_eq!(tuner.step_rung(), 9);

    tuner.update(0, now + 151);
    assert_eq!(tuner.step_rung(), 0);
}

#[test]
fn single_detent_after_long_idle_moves_one_fine_step() {
    let mut tuner = default_tuner();
    tuner.update(0, 5_000);
    let snap = tuner.update(1, 5_000);
    assert_eq!(snap.step_rung, 0);
    assert_eq!(snap.frequency_hz, START_HZ + 1.0);
}

#[test]
fn turbo_window_borrows_the_next_coarser_step_without_moving_the_rung() {
    let mut tuner = default_tuner();
    tuner.update(1, 1_000); // long gap: rung 0, fine step

    // 40 ms pacing classifies onto rung 7 (500 Hz) with multiplier 6.
    tuner.update(1, 1_040);
    let f1 = tuner.frequency_hz();
    assert_eq!(tuner.step_rung(), 7);

    tuner.update(1, 1_080); // second fast detent: plain 500 * 6
    let f2 = tuner.frequency_hz();
    assert_eq!(f2 - f1, 3_000.0);

    // Third fast detent arms turbo; the event borrows rung 8 (1000 Hz)
    // while the rung index stays put.
    tuner.update(1, 1_120);
    let f3 = tuner.frequency_hz();
    assert_eq!(f3 - f2, 6_000.0);
    assert_eq!(tuner.step_rung(), 7);

    // Still inside the 250 ms window: borrowed step again.
    tuner.update(1, 1_160);
    assert_eq!(tuner.frequency_hz() - f3, 6_000.0);
    assert_eq!(tuner.step_rung(), 7);
}

#[test]
fn turbo_window_expires() {
    let mut tuner = default_tuner();
    tuner.update(1, 1_000);
    spin(&mut tuner, 1_000, 40, 3); // armed: window ends at 1_370

    // Next event lands past expiry with a 400 ms gap: hysteresis sheds
    // rungs down to 1 and no borrowed step applies.
    let before = tuner.frequency_hz();
    tuner.update(1, 1_520);
    assert_eq!(tuner.frequency_hz() - before, 5.0);
    assert_eq!(tuner.step_rung(), 1);
}

#[test]
fn frequency_is_clamped_at_the_band_edges() {
    let cfg = TunerCfg {
        start_hz: 7_199_900.0,
        ..TunerCfg::default()
    };
    let mut tuner = Tuner::new(cfg, StepLadder::default());
    spin(&mut tuner, 1_000, 25, 100);
    assert_eq!(tuner.frequency_hz(), F_MAX_HZ);

    // And back down against the lower edge.
    let cfg = TunerCfg {
        start_hz: 7_000_050.0,
        ..TunerCfg::default()
    };
    let mut tuner = Tuner::new(cfg, StepLadder::default());
    let mut now = 1_000;
    for _ in 0..100 {
        now += 25;
        tuner.update(-1, now);
    }
    assert_eq!(tuner.frequency_hz(), F_MIN_HZ);
}

#[test]
fn only_the_sign_of_the_coalesced_count_steers_frequency() {
    let mut few = default_tuner();
    let mut many = default_tuner();
    let mut now = 1_000;
    for _ in 0..20 {
        now += 80;
        few.update(1, now);
        many.update(7, now);
    }
    assert_eq!(few.frequency_hz(), many.frequency_hz());
    assert_eq!(few.step_rung(), many.step_rung());
}

#[test]
fn faster_detents_scale_the_per_event_multiplier() {
    // Same number of detents at the same rung-stable pacing, different
    // speeds: the faster train must cover more ground per event once both
    // are compared at identical rungs. Simplest observable: a fresh tuner
    // fed two detents 60 ms apart vs 240 ms apart.
    let mut fast = default_tuner();
    let mut slow = default_tuner();
    fast.update(1, 1_000);
    slow.update(1, 1_000);
    let f0 = fast.frequency_hz();
    let s0 = slow.frequency_hz();
    fast.update(1, 1_060);
    slow.update(1, 1_240);
    let fast_delta = fast.frequency_hz() - f0;
    let slow_delta = slow.frequency_hz() - s0;
    assert!(
        fast_delta > slow_delta,
        "fast {fast_delta} vs slow {slow_delta}"
    );
}

#[test]
fn set_frequency_clamps_and_rejects_non_finite() {
    let mut tuner = default_tuner();
    tuner.set_frequency(7_350_000.0);
    assert_eq!(tuner.frequency_hz(), F_MAX_HZ);
    tuner.set_frequency(1.0);
    assert_eq!(tuner.frequency_hz(), F_MIN_HZ);
    tuner.set_frequency(f64::NAN);
    assert_eq!(tuner.frequency_hz(), START_HZ);
}

#[test]
fn ladder_validation_catches_broken_tables() {
    let mut ladder = StepLadder::default();
    ladder.steps_hz[3] = ladder.steps_hz[2];
    assert!(ladder.validate().is_err());

    let mut ladder = StepLadder::default();
    ladder.up_ms[5] = ladder.up_ms[4] + 1;
    assert!(ladder.validate().is_err());

    let mut ladder = StepLadder::default();
    ladder.down_ms[5] = ladder.up_ms[5] - 1;
    assert!(ladder.validate().is_err());

    assert!(StepLadder::default().validate().is_ok());
}
