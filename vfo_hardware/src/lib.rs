#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Hardware backends for the VFO engine.
//!
//! Currently ships the simulated devices and the scripted encoder pump used
//! by the CLI and the integration tests. A real Si5351/SSD1306 backend
//! plugs in through the same `vfo_traits` seams.

pub mod error;
pub mod pump;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use vfo_traits::{DisplayFrame, FrequencyDisplay, Synthesizer};

use crate::error::HwError;

/// One recorded display update.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub band_label: String,
    pub frequency_hz: f64,
    pub step_rung: usize,
    pub cursor_digit: u32,
}

/// In-memory synthesizer. Records the last programmed frequency and output
/// state; can be told to fail the next command to exercise error paths.
#[derive(Debug, Default, Clone)]
pub struct SimulatedSynthesizer {
    last_hz: Arc<Mutex<Option<f64>>>,
    enabled: Arc<Mutex<bool>>,
    fail_next: Arc<AtomicBool>,
}

impl SimulatedSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frequency_hz(&self) -> Option<f64> {
        self.last_hz.lock().map(|g| *g).unwrap_or(None)
    }

    pub fn is_output_enabled(&self) -> bool {
        self.enabled.lock().map(|g| *g).unwrap_or(false)
    }

    /// The next command returns an I2C error instead of succeeding.
    pub fn fail_next_command(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_injected_fault(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Box::new(HwError::I2c("injected fault".into())));
        }
        Ok(())
    }
}

impl Synthesizer for SimulatedSynthesizer {
    fn set_frequency(
        &mut self,
        hz: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_injected_fault()?;
        if let Ok(mut g) = self.last_hz.lock() {
            *g = Some(hz);
        }
        tracing::debug!(hz, "synthesizer programmed");
        Ok(())
    }

    fn set_output_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_injected_fault()?;
        if let Ok(mut g) = self.enabled.lock() {
            *g = enabled;
        }
        tracing::debug!(enabled, "synthesizer output");
        Ok(())
    }
}

/// In-memory display. Keeps every frame it was shown, for assertions.
#[derive(Debug, Default, Clone)]
pub struct SimulatedDisplay {
    frames: Arc<Mutex<Vec<RecordedFrame>>>,
}

impl SimulatedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<RecordedFrame> {
        self.frames.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn last_frame(&self) -> Option<RecordedFrame> {
        self.frames.lock().ok().and_then(|g| g.last().cloned())
    }
}

impl FrequencyDisplay for SimulatedDisplay {
    fn show(
        &mut self,
        frame: DisplayFrame<'_>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let rec = RecordedFrame {
            band_label: frame.band_label.to_string(),
            frequency_hz: frame.frequency_hz,
            step_rung: frame.step_rung,
            cursor_digit: frame.cursor_digit,
        };
        tracing::debug!(
            frequency_hz = rec.frequency_hz,
            step_rung = rec.step_rung,
            cursor_digit = rec.cursor_digit,
            "display frame"
        );
        if let Ok(mut g) = self.frames.lock() {
            g.push(rec);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_fault_fails_exactly_one_command() {
        let mut synth = SimulatedSynthesizer::new();
        synth.fail_next_command();
        assert!(synth.set_frequency(7_074_000.0).is_err());
        assert!(synth.set_frequency(7_074_000.0).is_ok());
        assert_eq!(synth.last_frequency_hz(), Some(7_074_000.0));
    }

    #[test]
    fn display_records_frames_in_order() {
        let mut disp = SimulatedDisplay::new();
        for hz in [7_074_000.0, 7_074_010.0] {
            disp.show(DisplayFrame {
                band_label: "40 Meter",
                frequency_hz: hz,
                step_rung: 0,
                cursor_digit: 6,
            })
            .unwrap();
        }
        let frames = disp.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].frequency_hz, 7_074_010.0);
    }
}
