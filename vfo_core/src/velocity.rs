//! Exponential-moving-average detent rate estimation.
//!
//! Alternate speed signal to the interval thresholds in the tuner. The
//! smoothing factor is derived from elapsed time, `1 - exp(-rate * dt)`, so
//! the effective averaging window is time-normalized and the estimate does
//! not depend on the polling frequency.

/// EMA estimator of detent rate in detents per second.
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    alpha_per_second: f64,
    smoothed_rate: f64,
}

impl VelocityEstimator {
    pub fn new(alpha_per_second: f64) -> Self {
        Self {
            alpha_per_second,
            smoothed_rate: 0.0,
        }
    }

    /// Blend one polling interval's movement into the estimate.
    ///
    /// No motion is a no-op: the estimate reflects the rate while turning,
    /// not the time spent paused. A non-positive or non-finite `dt_seconds`
    /// also leaves the estimate untouched; timestamps from a drifting or
    /// re-read clock must not poison the average.
    pub fn update(&mut self, detents: i32, dt_seconds: f64) -> f64 {
        if detents == 0 || !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return self.smoothed_rate;
        }
        let instantaneous = f64::from(detents.unsigned_abs()) / dt_seconds;
        if !instantaneous.is_finite() {
            return self.smoothed_rate;
        }
        let alpha = 1.0 - (-self.alpha_per_second * dt_seconds).exp();
        self.smoothed_rate = (1.0 - alpha) * self.smoothed_rate + alpha * instantaneous;
        self.smoothed_rate
    }

    /// Current smoothed rate, detents per second. Never negative.
    pub fn rate(&self) -> f64 {
        self.smoothed_rate
    }

    pub fn reset(&mut self) {
        self.smoothed_rate = 0.0;
    }
}
