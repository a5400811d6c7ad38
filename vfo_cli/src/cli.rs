//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "vfo", version, about = "Rotary-encoder VFO tuning engine")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/vfo.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also write JSON logs to this file
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scripted operator session against simulated hardware
    Sim {
        /// Number of detents to turn the knob
        #[arg(long, default_value_t = 20)]
        detents: u32,

        /// Inter-detent interval in ms (smaller = faster spin = coarser steps)
        #[arg(long = "interval-ms", value_name = "MS", default_value_t = 40)]
        interval_ms: u64,

        /// Spin counter-clockwise (tune down)
        #[arg(long, action = ArgAction::SetTrue)]
        reverse: bool,

        /// Number of switch presses after the spin (each advances the cursor)
        #[arg(long, default_value_t = 0)]
        presses: u32,

        /// Idle pause in ms between the spin and the presses
        #[arg(long = "dwell-ms", value_name = "MS", default_value_t = 0)]
        dwell_ms: u64,

        /// Run in real time through the background pump instead of the
        /// deterministic manual clock (Ctrl-C stops the session)
        #[arg(long, action = ArgAction::SetTrue)]
        live: bool,
    },
    /// Parse and validate the config file, print the effective settings
    CheckConfig,
}
