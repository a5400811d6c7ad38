//! Test and helper mocks for vfo_core

use vfo_traits::{DisplayFrame, FrequencyDisplay, Synthesizer};

/// A synthesizer that accepts and discards every command; useful when only
/// the tuning math is under test.
pub struct NullSynthesizer;

impl Synthesizer for NullSynthesizer {
    fn set_frequency(
        &mut self,
        _hz: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
    fn set_output_enabled(
        &mut self,
        _enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A display that discards every frame.
pub struct NullDisplay;

impl FrequencyDisplay for NullDisplay {
    fn show(
        &mut self,
        _frame: DisplayFrame<'_>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
