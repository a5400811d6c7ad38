#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the VFO tuning engine.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. The
//! runtime structs live in `vfo_core`; the CLI maps this schema onto them.
//! Validation enforces the ladder invariants (strictly increasing steps,
//! non-increasing promote/demote thresholds with `down >= up` hysteresis)
//! and the band ordering, so a bad TOML file fails at startup rather than
//! producing an out-of-band frequency later.

use serde::Deserialize;
use thiserror::Error;

/// Number of rungs in the step ladder.
pub const LADDER_RUNGS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid band: {0}")]
    Band(&'static str),
    #[error("invalid ladder: {0}")]
    Ladder(&'static str),
    #[error("invalid tuner timing: {0}")]
    Tuner(&'static str),
    #[error("invalid encoder config: {0}")]
    Encoder(&'static str),
    #[error("invalid estimator config: {0}")]
    Estimator(&'static str),
}

/// Tuning band edges and the power-on frequency.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Band {
    pub f_min_hz: f64,
    pub f_max_hz: f64,
    pub start_hz: f64,
    pub label: String,
}

impl Default for Band {
    fn default() -> Self {
        // 40-meter amateur band; the start frequency is the FT8 calling
        // frequency the synthesizer is programmed with at power-on.
        Self {
            f_min_hz: 7_000_000.0,
            f_max_hz: 7_200_000.0,
            start_hz: 7_074_000.0,
            label: "40 Meter".to_string(),
        }
    }
}

/// Step-size ladder with parallel promotion/demotion threshold tables.
///
/// `up_ms[i]` answers "is the inter-detent interval short enough to move to
/// rung i"; `down_ms[i]` answers "is it long enough to leave rung i". Keeping
/// `down_ms[i] >= up_ms[i]` is what prevents chattering at a band edge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Ladder {
    pub steps_hz: Vec<f64>,
    pub up_ms: Vec<u64>,
    pub down_ms: Vec<u64>,
}

impl Default for Ladder {
    fn default() -> Self {
        Self {
            steps_hz: vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0],
            // Index 0 carries the "always reachable" sentinel.
            up_ms: vec![u64::MAX, 320, 240, 180, 130, 95, 70, 52, 38, 28],
            down_ms: vec![u64::MAX, 480, 360, 270, 200, 145, 110, 80, 60, 45],
        }
    }
}

/// Ballistic tuner timing policy.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TunerTiming {
    /// Collapse to the finest rung after this much idle time (ms).
    pub idle_reset_ms: u64,
    /// A detent counts toward the turbo streak when its interval is below this (ms).
    pub turbo_idi_ms: u64,
    /// Length of the armed turbo window (ms).
    pub turbo_window_ms: u64,
    /// Consecutive fast detents required to arm turbo.
    pub turbo_streak: u8,
    /// Reference interval for the inverse per-event multiplier (ms).
    pub multiplier_ref_ms: u64,
    /// Effective minimum interval when deriving the multiplier (ms).
    pub multiplier_floor_ms: u64,
    /// Upper bound for the per-event multiplier.
    pub multiplier_max: u32,
}

impl Default for TunerTiming {
    fn default() -> Self {
        Self {
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

/// Encoder front-end knobs.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Encoder {
    /// Accumulated ticks per detent. Some encoders report two or four edge
    /// transitions per mechanical click; this is hardware-specific, not a
    /// universal divide-by-two.
    pub detent_divisor: u32,
    /// Delay before the switch confirmation re-reads the pin level (ms).
    pub debounce_ms: u64,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            detent_divisor: 1,
            debounce_ms: 50,
        }
    }
}

/// Velocity estimator smoothing.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Estimator {
    /// Time-normalized smoothing rate; effective alpha per update is
    /// `1 - exp(-alpha_per_second * dt)`.
    pub alpha_per_second: f64,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            alpha_per_second: 8.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    pub json: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub band: Band,
    pub ladder: Ladder,
    pub tuner: TunerTiming,
    pub encoder: Encoder,
    pub estimator: Estimator,
    pub logging: Logging,
}

impl Config {
    /// Validate cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.band;
        if !(b.f_min_hz.is_finite() && b.f_max_hz.is_finite() && b.start_hz.is_finite()) {
            return Err(ConfigError::Band("band edges must be finite"));
        }
        if b.f_min_hz >= b.f_max_hz {
            return Err(ConfigError::Band("f_min_hz must be below f_max_hz"));
        }
        if b.start_hz < b.f_min_hz || b.start_hz > b.f_max_hz {
            return Err(ConfigError::Band("start_hz must lie inside the band"));
        }

        let l = &self.ladder;
        if l.steps_hz.len() != LADDER_RUNGS
            || l.up_ms.len() != LADDER_RUNGS
            || l.down_ms.len() != LADDER_RUNGS
        {
            return Err(ConfigError::Ladder("ladder tables must have 10 entries"));
        }
        for w in l.steps_hz.windows(2) {
            if !(w[1] > w[0]) {
                return Err(ConfigError::Ladder("steps_hz must be strictly increasing"));
            }
        }
        if l.steps_hz[0] <= 0.0 || !l.steps_hz.iter().all(|s| s.is_finite()) {
            return Err(ConfigError::Ladder("steps_hz must be finite and positive"));
        }
        for w in l.up_ms.windows(2) {
            if w[1] > w[0] {
                return Err(ConfigError::Ladder("up_ms must be non-increasing"));
            }
        }
        for w in l.down_ms.windows(2) {
            if w[1] > w[0] {
                return Err(ConfigError::Ladder("down_ms must be non-increasing"));
            }
        }
        for i in 0..LADDER_RUNGS {
            if l.down_ms[i] < l.up_ms[i] {
                return Err(ConfigError::Ladder("down_ms must be >= up_ms per rung"));
            }
        }

        let t = &self.tuner;
        if t.turbo_streak == 0 {
            return Err(ConfigError::Tuner("turbo_streak must be >= 1"));
        }
        if t.multiplier_max == 0 {
            return Err(ConfigError::Tuner("multiplier_max must be >= 1"));
        }
        if t.multiplier_floor_ms == 0 {
            return Err(ConfigError::Tuner("multiplier_floor_ms must be >= 1"));
        }

        if self.encoder.detent_divisor == 0 {
            return Err(ConfigError::Encoder("detent_divisor must be >= 1"));
        }
        if self.encoder.debounce_ms == 0 {
            return Err(ConfigError::Encoder("debounce_ms must be >= 1"));
        }

        if !(self.estimator.alpha_per_second > 0.0) || !self.estimator.alpha_per_second.is_finite()
        {
            return Err(ConfigError::Estimator("alpha_per_second must be positive"));
        }

        Ok(())
    }
}

/// Parse and validate a TOML config document.
pub fn load_toml(s: &str) -> Result<Config, ConfigError> {
    let cfg = toml::from_str::<Config>(s)?;
    cfg.validate()?;
    Ok(cfg)
}
