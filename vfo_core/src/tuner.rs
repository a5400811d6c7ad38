//! Ballistic step sizing.
//!
//! The tuner converts net detent movement plus wall-clock timing into a
//! clamped target frequency. Spin speed is classified onto a 10-rung step
//! ladder with two threshold tables: `up_ms` (tight) gates promotion to a
//! coarser rung, `down_ms` (loose) gates demotion back, so a spin rate
//! sitting near a boundary cannot chatter between rungs. Sustained fast
//! spinning additionally arms a short "turbo" window that borrows the
//! next-coarser step without moving the rung itself.
//!
//! Everything is sanitized by clamping or flooring; `update` cannot fail.

/// Number of rungs in the step ladder.
pub const LADDER_RUNGS: usize = 10;

/// Immutable step ladder: sizes plus promotion/demotion thresholds.
///
/// Invariants (checked by [`StepLadder::validate`]):
/// - `steps_hz` strictly increasing;
/// - `up_ms` non-increasing, with a `u64::MAX` sentinel at index 0;
/// - `down_ms` non-increasing and `down_ms[i] >= up_ms[i]` per rung.
#[derive(Debug, Clone)]
pub struct StepLadder {
    pub steps_hz: [f64; LADDER_RUNGS],
    pub up_ms: [u64; LADDER_RUNGS],
    pub down_ms: [u64; LADDER_RUNGS],
}

impl Default for StepLadder {
    fn default() -> Self {
        Self {
            steps_hz: [1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0],
            up_ms: [u64::MAX, 320, 240, 180, 130, 95, 70, 52, 38, 28],
            down_ms: [u64::MAX, 480, 360, 270, 200, 145, 110, 80, 60, 45],
        }
    }
}

impl StepLadder {
    /// Check the ladder invariants, returning a static description of the
    /// first violation.
    pub fn validate(&self) -> Result<(), &'static str> {
        for w in self.steps_hz.windows(2) {
            if !(w[1] > w[0]) {
                return Err("steps_hz must be strictly increasing");
            }
        }
        if !(self.steps_hz[0] > 0.0) || !self.steps_hz.iter().all(|s| s.is_finite()) {
            return Err("steps_hz must be finite and positive");
        }
        for w in self.up_ms.windows(2) {
            if w[1] > w[0] {
                return Err("up_ms must be non-increasing");
            }
        }
        for w in self.down_ms.windows(2) {
            if w[1] > w[0] {
                return Err("down_ms must be non-increasing");
            }
        }
        for i in 0..LADDER_RUNGS {
            if self.down_ms[i] < self.up_ms[i] {
                return Err("down_ms must be >= up_ms per rung");
            }
        }
        Ok(())
    }
}

/// Tuner policy knobs. All durations in milliseconds.
#[derive(Debug, Clone)]
pub struct TunerCfg {
    pub f_min_hz: f64,
    pub f_max_hz: f64,
    pub start_hz: f64,
    /// Collapse to the finest rung after this much idle ("precision dwell").
    pub idle_reset_ms: u64,
    /// Intervals below this count toward the turbo streak.
    pub turbo_idi_ms: u64,
    /// Length of the armed turbo window.
    pub turbo_window_ms: u64,
    /// Consecutive fast detents required to arm turbo.
    pub turbo_streak: u8,
    /// Reference interval for the inverse per-event multiplier.
    pub multiplier_ref_ms: u64,
    /// Effective minimum interval when deriving the multiplier; the floor
    /// keeps the multiplier bounded on very tight detent spacing.
    pub multiplier_floor_ms: u64,
    /// Upper bound for the per-event multiplier.
    pub multiplier_max: u32,
}

impl Default for TunerCfg {
    fn default() -> Self {
        Self {
            f_min_hz: 7_000_000.0,
            f_max_hz: 7_200_000.0,
            start_hz: 7_074_000.0,
            idle_reset_ms: 150,
            turbo_idi_ms: 70,
            turbo_window_ms: 250,
            turbo_streak: 3,
            multiplier_ref_ms: 240,
            multiplier_floor_ms: 30,
            multiplier_max: 8,
        }
    }
}

/// Result of one tuner update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunerSnapshot {
    pub frequency_hz: f64,
    /// Current ladder rung, 0 = finest.
    pub step_rung: usize,
}

/// Ballistic step tuner. Exercised by a single thread; no I/O, no locks.
#[derive(Debug)]
pub struct BallisticTuner {
    cfg: TunerCfg,
    ladder: StepLadder,
    step_index: usize,
    frequency_hz: f64,
    last_move_ms: u64,
    last_detent_ms: u64,
    turbo_until_ms: u64,
    fast_streak: u8,
}

impl BallisticTuner {
    /// Build a tuner. Assumes `ladder.validate()` passed and the band is
    /// ordered; the builder in `lib.rs` enforces both.
    pub fn new(cfg: TunerCfg, ladder: StepLadder) -> Self {
        let start = cfg.start_hz.clamp(cfg.f_min_hz, cfg.f_max_hz);
        Self {
            cfg,
            ladder,
            step_index: 0,
            frequency_hz: start,
            last_move_ms: 0,
            last_detent_ms: 0,
            turbo_until_ms: 0,
            fast_streak: 0,
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn step_rung(&self) -> usize {
        self.step_index
    }

    /// Jump to an absolute frequency, clamped to the band.
    pub fn set_frequency(&mut self, hz: f64) {
        let hz = if hz.is_finite() { hz } else { self.cfg.start_hz };
        self.frequency_hz = hz.clamp(self.cfg.f_min_hz, self.cfg.f_max_hz);
    }

    pub fn snapshot(&self) -> TunerSnapshot {
        TunerSnapshot {
            frequency_hz: self.frequency_hz,
            step_rung: self.step_index,
        }
    }

    /// Apply one polling interval's net detent count at time `now_ms`.
    ///
    /// The count is already coalesced; only its sign steers the frequency,
    /// while the event timing drives rung selection and the multiplier.
    pub fn update(&mut self, detents: i32, now_ms: u64) -> TunerSnapshot {
        if detents == 0 {
            // Precision dwell: a pause collapses back to the finest step.
            if now_ms.saturating_sub(self.last_move_ms) > self.cfg.idle_reset_ms {
                self.step_index = 0;
            }
            return self.snapshot();
        }

        let idi = now_ms.saturating_sub(self.last_detent_ms);
        self.last_detent_ms = now_ms;
        self.last_move_ms = now_ms;

        // Hysteretic rung classification: promote on the tight table, then
        // demote on the loose one.
        while self.step_index + 1 < LADDER_RUNGS && self.ladder.up_ms[self.step_index + 1] >= idi {
            self.step_index += 1;
        }
        while self.step_index > 0 && self.ladder.down_ms[self.step_index] <= idi {
            self.step_index -= 1;
        }

        // Turbo accumulation: a run of tightly spaced detents arms a short
        // boost window; one slow detent breaks the streak but leaves an
        // already-armed window alone.
        if idi < self.cfg.turbo_idi_ms {
            self.fast_streak = self.fast_streak.saturating_add(1);
            if self.fast_streak >= self.cfg.turbo_streak {
                self.turbo_until_ms = now_ms.saturating_add(self.cfg.turbo_window_ms);
                self.fast_streak = 0;
                tracing::debug!(until_ms = self.turbo_until_ms, "turbo window armed");
            }
        } else {
            self.fast_streak = 0;
        }

        let multiplier = self.event_multiplier(idi);

        // Inside the turbo window, borrow the next-coarser step for this
        // event only; the rung index itself stays put.
        let mut rung = self.step_index;
        if now_ms < self.turbo_until_ms && rung + 1 < LADDER_RUNGS {
            rung += 1;
        }
        let step = self.ladder.steps_hz[rung];

        let delta = step * f64::from(multiplier) * f64::from(detents.signum());
        self.frequency_hz =
            (self.frequency_hz + delta).clamp(self.cfg.f_min_hz, self.cfg.f_max_hz);

        tracing::trace!(
            idi_ms = idi,
            rung = self.step_index,
            effective_rung = rung,
            multiplier,
            frequency_hz = self.frequency_hz,
            "tuner update"
        );
        self.snapshot()
    }

    /// Per-event multiplier in `[1, multiplier_max]`, inverse in the
    /// inter-detent interval and floored at the effective minimum interval.
    #[inline]
    fn event_multiplier(&self, idi_ms: u64) -> u32 {
        let eff = idi_ms.max(self.cfg.multiplier_floor_ms).max(1);
        let m = self.cfg.multiplier_ref_ms / eff;
        (m.min(u64::from(self.cfg.multiplier_max)) as u32).max(1)
    }
}

#[cfg(test)]
mod multiplier_tests {
    use super::*;

    #[test]
    fn multiplier_is_inverse_and_bounded() {
        let t = BallisticTuner::new(TunerCfg::default(), StepLadder::default());
        // ref=240, floor=30, max=8
        assert_eq!(t.event_multiplier(240), 1);
        assert_eq!(t.event_multiplier(120), 2);
        assert_eq!(t.event_multiplier(60), 4);
        assert_eq!(t.event_multiplier(30), 8);
        // Below the floor the multiplier stops growing.
        assert_eq!(t.event_multiplier(5), 8);
        assert_eq!(t.event_multiplier(0), 8);
        // Very slow never drops below 1.
        assert_eq!(t.event_multiplier(100_000), 1);
    }
}
