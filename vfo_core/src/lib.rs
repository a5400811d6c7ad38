#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core VFO tuning engine (hardware-agnostic).
//!
//! This crate converts raw, bursty rotary-encoder pulses into a smoothly
//! varying tuned frequency. All hardware interactions go through the
//! `vfo_traits::Synthesizer` and `vfo_traits::FrequencyDisplay` traits.
//!
//! ## Architecture
//!
//! - **Decoding**: Gray-code quadrature state machine (`decoder` module)
//! - **Debounce**: delayed level-based switch confirmation (`debounce`)
//! - **Handoff**: lock-free interrupt-to-loop event queue (`events`)
//! - **Ballistics**: hysteretic step ladder with turbo windows (`tuner`)
//! - **Velocity**: time-normalized EMA detent rate (`velocity`)
//!
//! Interrupt dispatch drives an [`EncoderFrontEnd`]; a single-threaded
//! polling loop calls [`VfoCore::poll`], which drains the queue, runs the
//! ballistic tuner, and pushes changes to the synthesizer and display sinks.

pub mod debounce;
pub mod decoder;
pub mod error;
pub mod events;
pub mod mocks;
pub mod tuner;
pub mod velocity;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use vfo_traits::clock::{Clock, MonotonicClock};
use vfo_traits::{DisplayFrame, FrequencyDisplay, Synthesizer};

use crate::debounce::SwitchDebouncer;
use crate::decoder::QuadratureDecoder;
use crate::error::{BuildError, Result, VfoError};
use crate::events::SharedEventQueue;
use crate::tuner::BallisticTuner;
use crate::velocity::VelocityEstimator;

pub use crate::tuner::{BallisticTuner as Tuner, LADDER_RUNGS, StepLadder, TunerCfg, TunerSnapshot};

/// Highest digit position the cursor can underline (MHz digit of a 7-digit
/// frequency); it cycles 6 -> 1 -> 2 ... -> 6.
const CURSOR_DIGITS: u32 = 6;

// Map any error to a typed VfoError, with special handling for hardware errors.
fn map_hw_error_dyn(e: &(dyn std::error::Error + 'static)) -> VfoError {
    #[cfg(feature = "hardware-errors")]
    {
        use vfo_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::I2c(_) | HwError::Gpio(_) => VfoError::HardwareFault(hw.to_string()),
                other => VfoError::Hardware(other.to_string()),
            };
        }
    }
    VfoError::Hardware(e.to_string())
}

/// Interrupt-side handle: minimal, bounded work per edge, no allocation.
///
/// Owns the quadrature decoder state (one front end per engine) and shares
/// the event queue with the polling side. Create it once via
/// [`VfoCore::front_end`] and hand it to whatever dispatches pin-change
/// interrupts.
pub struct EncoderFrontEnd {
    decoder: QuadratureDecoder,
    queue: Arc<SharedEventQueue>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    debounce_ms: u64,
}

impl EncoderFrontEnd {
    /// Pin-change interrupt on either quadrature line, with the raw levels.
    pub fn on_quadrature_edge(&mut self, a: bool, b: bool) {
        if let Some(dir) = self.decoder.sample_pins(a, b) {
            self.queue.publish_tick(dir);
        }
    }

    /// Edge on the switch line: schedule the delayed confirmation.
    pub fn on_switch_edge(&mut self) {
        let now = self.clock.ms_since(self.epoch);
        self.queue.schedule_confirm(now + self.debounce_ms);
    }
}

impl vfo_traits::EdgeSink for EncoderFrontEnd {
    fn quadrature_edge(&mut self, a: bool, b: bool) {
        self.on_quadrature_edge(a, b);
    }
    fn switch_edge(&mut self) {
        self.on_switch_edge();
    }
}

impl core::fmt::Debug for EncoderFrontEnd {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncoderFrontEnd")
            .field("debounce_ms", &self.debounce_ms)
            .finish()
    }
}

/// Unified engine for both dynamic (boxed) and generic (static dispatch) variants.
pub struct VfoCore<Y: Synthesizer, D: FrequencyDisplay> {
    synth: Y,
    display: D,
    tuner: BallisticTuner,
    estimator: VelocityEstimator,
    debouncer: SwitchDebouncer,
    queue: Arc<SharedEventQueue>,
    // Unified clock for deterministic time in tests
    clock: Arc<dyn Clock + Send + Sync>,
    // Epoch Instant for computing monotonic milliseconds
    epoch: Instant,
    // Live switch level, re-read at confirmation time
    switch_check: Box<dyn Fn() -> bool + Send>,
    band_label: String,
    // Accumulated ticks per detent; hardware-specific (see config docs)
    detent_divisor: i32,
    detent_remainder: i32,
    debounce_ms: u64,
    cursor_digit: u32,
    last_poll_ms: u64,
    // Last state pushed to the sinks; None until the first publish
    published: Option<(TunerSnapshot, u32)>,
}

impl<Y: Synthesizer, D: FrequencyDisplay> core::fmt::Debug for VfoCore<Y, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VfoCore")
            .field("frequency_hz", &self.tuner.frequency_hz())
            .field("step_rung", &self.tuner.step_rung())
            .field("cursor_digit", &self.cursor_digit)
            .finish()
    }
}

impl<Y: Synthesizer, D: FrequencyDisplay> VfoCore<Y, D> {
    /// Create the interrupt-side handle. Call once; the decoder's walk state
    /// lives in the handle, and a second handle would start a parallel walk.
    pub fn front_end(&self) -> EncoderFrontEnd {
        EncoderFrontEnd {
            decoder: QuadratureDecoder::new(),
            queue: Arc::clone(&self.queue),
            clock: Arc::clone(&self.clock),
            epoch: self.epoch,
            debounce_ms: self.debounce_ms,
        }
    }

    /// Shared queue, for platforms that latch events outside the front end.
    pub fn event_queue(&self) -> Arc<SharedEventQueue> {
        Arc::clone(&self.queue)
    }

    /// Enable the synthesizer output and push the initial frequency and
    /// display frame. Collaborator failure here is fatal for the caller.
    pub fn start(&mut self) -> Result<()> {
        self.synth
            .set_output_enabled(true)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("enable synthesizer output")?;
        let snap = self.tuner.snapshot();
        self.publish(snap)?;
        tracing::info!(
            band = %self.band_label,
            frequency_hz = snap.frequency_hz,
            "vfo started"
        );
        Ok(())
    }

    /// One iteration of the polling loop.
    ///
    /// Drains the accumulated ticks, runs the delayed switch confirmation if
    /// due, drives the ballistic tuner, and forwards any change to the
    /// synthesizer and display. Returns the tuner snapshot either way.
    pub fn poll(&mut self) -> Result<TunerSnapshot> {
        let now = self.clock.ms_since(self.epoch);

        // Debounce confirmation runs against the live pin level; the edge
        // that scheduled it may be long stale.
        if self.queue.take_due_confirm(now) {
            let level = (self.switch_check)();
            if self.debouncer.confirm(level) {
                self.queue.publish_press();
            }
        }

        // Atomic read-and-clear; the divisor remainder carries over so slow
        // half-detent creep is not silently discarded.
        let ticks = self.queue.drain_ticks() + self.detent_remainder;
        let detents = ticks / self.detent_divisor;
        self.detent_remainder = ticks % self.detent_divisor;

        let dt_s = (now.saturating_sub(self.last_poll_ms)) as f64 / 1000.0;
        self.last_poll_ms = now;
        self.estimator.update(detents, dt_s);

        let snap = self.tuner.update(detents, now);

        if self.queue.take_press() {
            self.cursor_digit = if self.cursor_digit >= CURSOR_DIGITS {
                1
            } else {
                self.cursor_digit + 1
            };
            tracing::debug!(cursor_digit = self.cursor_digit, "cursor advanced");
        }

        if self.published != Some((snap, self.cursor_digit)) {
            self.publish(snap)?;
        }
        Ok(snap)
    }

    fn publish(&mut self, snap: TunerSnapshot) -> Result<()> {
        self.synth
            .set_frequency(snap.frequency_hz)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("set_frequency")?;
        self.display
            .show(DisplayFrame {
                band_label: &self.band_label,
                frequency_hz: snap.frequency_hz,
                step_rung: snap.step_rung,
                cursor_digit: self.cursor_digit,
            })
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("display show")?;
        self.published = Some((snap, self.cursor_digit));
        Ok(())
    }

    /// Current tuned frequency in Hz.
    pub fn frequency_hz(&self) -> f64 {
        self.tuner.frequency_hz()
    }

    /// Current ladder rung (0 = finest).
    pub fn step_rung(&self) -> usize {
        self.tuner.step_rung()
    }

    /// Digit position currently underlined on the display.
    pub fn cursor_digit(&self) -> u32 {
        self.cursor_digit
    }

    /// Diagnostics: smoothed detent rate in detents per second.
    pub fn detent_rate(&self) -> f64 {
        self.estimator.rate()
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Public dynamic (boxed) engine built by [`VfoBuilder`].
pub type Vfo = VfoCore<Box<dyn Synthesizer>, Box<dyn FrequencyDisplay>>;

impl Vfo {
    /// Start building a Vfo.
    pub fn builder() -> VfoBuilder<Missing, Missing> {
        VfoBuilder::default()
    }
}

/// Builder for [`Vfo`]. All fields are validated on `build()`.
pub struct VfoBuilder<Y, D> {
    synth: Option<Box<dyn Synthesizer>>,
    display: Option<Box<dyn FrequencyDisplay>>,
    tuner: Option<TunerCfg>,
    ladder: Option<StepLadder>,
    alpha_per_second: Option<f64>,
    band_label: Option<String>,
    detent_divisor: Option<u32>,
    debounce_ms: Option<u64>,
    switch_check: Option<Box<dyn Fn() -> bool + Send>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    // Type-state markers
    _y: PhantomData<Y>,
    _d: PhantomData<D>,
}

impl Default for VfoBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            synth: None,
            display: None,
            tuner: None,
            ladder: None,
            alpha_per_second: None,
            band_label: None,
            detent_divisor: None,
            debounce_ms: None,
            switch_check: None,
            clock: None,
            _y: PhantomData,
            _d: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state
impl<Y, D> VfoBuilder<Y, D> {
    pub fn with_tuner(mut self, cfg: TunerCfg) -> Self {
        self.tuner = Some(cfg);
        self
    }
    pub fn with_ladder(mut self, ladder: StepLadder) -> Self {
        self.ladder = Some(ladder);
        self
    }
    pub fn with_band_label(mut self, label: impl Into<String>) -> Self {
        self.band_label = Some(label.into());
        self
    }
    pub fn with_detent_divisor(mut self, divisor: u32) -> Self {
        self.detent_divisor = Some(divisor);
        self
    }
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = Some(ms);
        self
    }
    pub fn with_estimator_alpha(mut self, alpha_per_second: f64) -> Self {
        self.alpha_per_second = Some(alpha_per_second);
        self
    }
    /// Live switch level reader used by the debounce confirmation.
    pub fn with_switch_check<F>(mut self, f: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        self.switch_check = Some(Box::new(f));
        self
    }
    /// Provide a custom clock implementation; defaults to MonotonicClock.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Map a validated `vfo_config::Config` onto the runtime settings.
    /// Fails if the ladder tables do not carry exactly ten rungs.
    pub fn with_config(mut self, cfg: &vfo_config::Config) -> std::result::Result<Self, BuildError> {
        let steps_hz: [f64; LADDER_RUNGS] = cfg
            .ladder
            .steps_hz
            .as_slice()
            .try_into()
            .map_err(|_| BuildError::InvalidConfig("ladder tables must have 10 entries"))?;
        let up_ms: [u64; LADDER_RUNGS] = cfg
            .ladder
            .up_ms
            .as_slice()
            .try_into()
            .map_err(|_| BuildError::InvalidConfig("ladder tables must have 10 entries"))?;
        let down_ms: [u64; LADDER_RUNGS] = cfg
            .ladder
            .down_ms
            .as_slice()
            .try_into()
            .map_err(|_| BuildError::InvalidConfig("ladder tables must have 10 entries"))?;
        self.ladder = Some(StepLadder {
            steps_hz,
            up_ms,
            down_ms,
        });
        self.tuner = Some(TunerCfg {
            f_min_hz: cfg.band.f_min_hz,
            f_max_hz: cfg.band.f_max_hz,
            start_hz: cfg.band.start_hz,
            idle_reset_ms: cfg.tuner.idle_reset_ms,
            turbo_idi_ms: cfg.tuner.turbo_idi_ms,
            turbo_window_ms: cfg.tuner.turbo_window_ms,
            turbo_streak: cfg.tuner.turbo_streak,
            multiplier_ref_ms: cfg.tuner.multiplier_ref_ms,
            multiplier_floor_ms: cfg.tuner.multiplier_floor_ms,
            multiplier_max: cfg.tuner.multiplier_max,
        });
        self.band_label = Some(cfg.band.label.clone());
        self.detent_divisor = Some(cfg.encoder.detent_divisor);
        self.debounce_ms = Some(cfg.encoder.debounce_ms);
        self.alpha_per_second = Some(cfg.estimator.alpha_per_second);
        Ok(self)
    }

    /// Fallible build available in any type-state; returns a detailed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<Vfo> {
        let VfoBuilder {
            synth,
            display,
            tuner,
            ladder,
            alpha_per_second,
            band_label,
            detent_divisor,
            debounce_ms,
            switch_check,
            clock,
            _y: _,
            _d: _,
        } = self;

        let synth = synth.ok_or_else(|| eyre::Report::new(BuildError::MissingSynthesizer))?;
        let display = display.ok_or_else(|| eyre::Report::new(BuildError::MissingDisplay))?;

        let tuner_cfg = tuner.unwrap_or_default();
        let ladder = ladder.unwrap_or_default();
        let alpha_per_second = alpha_per_second.unwrap_or(8.0);
        let band_label = band_label.unwrap_or_else(|| "40 Meter".to_string());
        let detent_divisor = detent_divisor.unwrap_or(1);
        let debounce_ms = debounce_ms.unwrap_or(50);
        let switch_check = switch_check.unwrap_or_else(|| Box::new(|| false));
        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        // Validate configs (non-panicking; return typed errors)
        if !(tuner_cfg.f_min_hz.is_finite() && tuner_cfg.f_max_hz.is_finite()) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "band edges must be finite",
            )));
        }
        if tuner_cfg.f_min_hz >= tuner_cfg.f_max_hz {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "f_min_hz must be below f_max_hz",
            )));
        }
        if !tuner_cfg.start_hz.is_finite()
            || tuner_cfg.start_hz < tuner_cfg.f_min_hz
            || tuner_cfg.start_hz > tuner_cfg.f_max_hz
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "start_hz must lie inside the band",
            )));
        }
        if let Err(msg) = ladder.validate() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(msg)));
        }
        if tuner_cfg.turbo_streak == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "turbo_streak must be >= 1",
            )));
        }
        if tuner_cfg.multiplier_max == 0 || tuner_cfg.multiplier_floor_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "multiplier bounds must be >= 1",
            )));
        }
        if detent_divisor == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "detent_divisor must be >= 1",
            )));
        }
        if debounce_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "debounce_ms must be >= 1",
            )));
        }
        if !(alpha_per_second > 0.0) || !alpha_per_second.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "alpha_per_second must be positive",
            )));
        }

        let epoch = clock.now();
        Ok(VfoCore {
            synth,
            display,
            tuner: BallisticTuner::new(tuner_cfg, ladder),
            estimator: VelocityEstimator::new(alpha_per_second),
            debouncer: SwitchDebouncer::new(),
            queue: Arc::new(SharedEventQueue::new()),
            clock,
            epoch,
            switch_check,
            band_label,
            detent_divisor: detent_divisor as i32,
            detent_remainder: 0,
            debounce_ms,
            cursor_digit: CURSOR_DIGITS,
            last_poll_ms: 0,
            published: None,
        })
    }
}

// Setters that advance type-state when providing mandatory components
impl<D> VfoBuilder<Missing, D> {
    pub fn with_synthesizer(self, synth: impl Synthesizer + 'static) -> VfoBuilder<Set, D> {
        VfoBuilder {
            synth: Some(Box::new(synth)),
            display: self.display,
            tuner: self.tuner,
            ladder: self.ladder,
            alpha_per_second: self.alpha_per_second,
            band_label: self.band_label,
            detent_divisor: self.detent_divisor,
            debounce_ms: self.debounce_ms,
            switch_check: self.switch_check,
            clock: self.clock,
            _y: PhantomData,
            _d: PhantomData,
        }
    }
}

impl<Y> VfoBuilder<Y, Missing> {
    pub fn with_display(self, display: impl FrequencyDisplay + 'static) -> VfoBuilder<Y, Set> {
        VfoBuilder {
            synth: self.synth,
            display: Some(Box::new(display)),
            tuner: self.tuner,
            ladder: self.ladder,
            alpha_per_second: self.alpha_per_second,
            band_label: self.band_label,
            detent_divisor: self.detent_divisor,
            debounce_ms: self.debounce_ms,
            switch_check: self.switch_check,
            clock: self.clock,
            _y: PhantomData,
            _d: PhantomData,
        }
    }
}

impl VfoBuilder<Set, Set> {
    /// Validate and build. Only available once synthesizer and display are set.
    pub fn build(self) -> Result<Vfo> {
        self.try_build()
    }
}
