pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Frequency programming sink (e.g. an Si5351 behind I2C). Pure sink: the
/// core pushes a target frequency and never reads back.
pub trait Synthesizer {
    fn set_frequency(
        &mut self,
        hz: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_output_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// One presentation update for the display/telemetry sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayFrame<'a> {
    pub band_label: &'a str,
    pub frequency_hz: f64,
    /// Current ladder rung, 0 = finest.
    pub step_rung: usize,
    /// Digit position for the cursor underline, 1 (coarsest drawn) ..= 6.
    pub cursor_digit: u32,
}

pub trait FrequencyDisplay {
    fn show(
        &mut self,
        frame: DisplayFrame<'_>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Receiver of raw encoder edges, as a hardware interrupt dispatcher or a
/// simulated pump would deliver them.
pub trait EdgeSink: Send {
    /// Pin-change on either quadrature line, with both raw levels.
    fn quadrature_edge(&mut self, a: bool, b: bool);
    /// Any edge on the switch line.
    fn switch_edge(&mut self);
}

impl<T: EdgeSink + ?Sized> EdgeSink for Box<T> {
    fn quadrature_edge(&mut self, a: bool, b: bool) {
        (**self).quadrature_edge(a, b);
    }
    fn switch_edge(&mut self) {
        (**self).switch_edge();
    }
}

impl<T: Synthesizer + ?Sized> Synthesizer for Box<T> {
    fn set_frequency(
        &mut self,
        hz: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_frequency(hz)
    }
    fn set_output_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_output_enabled(enabled)
    }
}

impl<T: FrequencyDisplay + ?Sized> FrequencyDisplay for Box<T> {
    fn show(
        &mut self,
        frame: DisplayFrame<'_>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).show(frame)
    }
}
