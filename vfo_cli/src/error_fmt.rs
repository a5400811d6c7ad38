//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::JSON_MODE;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use vfo_core::error::{BuildError, VfoError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSynthesizer => {
                "What happened: No synthesizer was provided to the tuning engine.\nLikely causes: The Si5351 failed to initialize or was not wired into the builder.\nHow to fix: Ensure the synthesizer is created successfully and passed via with_synthesizer(...).".to_string()
            }
            BuildError::MissingDisplay => {
                "What happened: No display was provided to the tuning engine.\nLikely causes: The display failed to initialize or was not wired into the builder.\nHow to fix: Ensure the display is created successfully and passed via with_display(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ve) = err.downcast_ref::<VfoError>() {
        return match ve {
            VfoError::HardwareFault(msg) => format!(
                "What happened: A hardware bus fault ({msg}).\nLikely causes: I2C wiring, address conflict, or a powered-down peripheral.\nHow to fix: Check SDA/SCL wiring and device power, then rerun."
            ),
            VfoError::Hardware(msg) => format!(
                "What happened: A hardware collaborator failed ({msg}).\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
            VfoError::Config(msg) => format!(
                "What happened: Invalid runtime configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<vfo_config::ConfigError>() {
        return format!(
            "What happened: The config file did not validate ({ce}).\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Fix the named field; `vfo check-config` prints the effective settings."
        );
    }

    // String-based heuristics for errors coming from init or I/O
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("no such file") || lower.contains("read config") {
        return format!(
            "What happened: {msg}.\nLikely causes: The --config path does not exist.\nHow to fix: Point --config at a valid TOML file or omit it to use the defaults."
        );
    }

    format!(
        "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug for more detail."
    )
}

/// Emit the final error to stderr, as JSON lines when requested.
pub fn report(err: &eyre::Report) {
    if JSON_MODE.get().copied().unwrap_or(false) {
        let obj = serde_json::json!({
            "event": "error",
            "error": err.to_string(),
            "detail": humanize(err),
        });
        eprintln!("{obj}");
    } else {
        eprintln!("{}", humanize(err));
    }
}
