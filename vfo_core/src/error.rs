use thiserror::Error;

/// Runtime errors surfaced from the polling loop. The tuning algorithms
/// themselves never fail; everything here comes from a collaborator.
#[derive(Debug, Error, Clone)]
pub enum VfoError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing synthesizer")]
    MissingSynthesizer,
    #[error("missing display")]
    MissingDisplay,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
