use thiserror::Error;

/// Hardware-level failures surfaced by synthesizer, display and GPIO
/// backends. Carried as strings so backend crates stay out of the public
/// error surface.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c: {0}")]
    I2c(String),
    #[error("gpio: {0}")]
    Gpio(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
