//! `vfo` binary: config loading, logging setup, and command dispatch.

mod cli;
mod error_fmt;
mod sim;

use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::sim::SimArgs;

fn init_logging(json: bool, level: &str, file: Option<&Path>) -> Result<()> {
    type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

    let console: BoxedLayer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    let mut layers = vec![console];

    if let Some(path) = file {
        let file = std::fs::File::create(path)
            .wrap_err_with(|| format!("create log file {}", path.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry().with(layers).with(filter).init();
    Ok(())
}

/// Read and validate the config file; `false` means the path did not exist
/// and the built-in defaults are in effect.
fn load_config(path: &Path) -> Result<(vfo_config::Config, bool)> {
    if path.exists() {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read config {}", path.display()))?;
        let cfg = vfo_config::load_toml(&text)
            .wrap_err_with(|| format!("validate config {}", path.display()))?;
        Ok((cfg, true))
    } else {
        Ok((vfo_config::Config::default(), false))
    }
}

fn print_check_config(cfg: &vfo_config::Config, json: bool) {
    if json {
        let obj = serde_json::json!({
            "event": "check_config",
            "band": {
                "label": cfg.band.label,
                "f_min_hz": cfg.band.f_min_hz,
                "f_max_hz": cfg.band.f_max_hz,
                "start_hz": cfg.band.start_hz,
            },
            "ladder": {
                "steps_hz": cfg.ladder.steps_hz,
                "up_ms": cfg.ladder.up_ms,
                "down_ms": cfg.ladder.down_ms,
            },
            "encoder": {
                "detent_divisor": cfg.encoder.detent_divisor,
                "debounce_ms": cfg.encoder.debounce_ms,
            },
            "tuner": {
                "idle_reset_ms": cfg.tuner.idle_reset_ms,
                "turbo_idi_ms": cfg.tuner.turbo_idi_ms,
                "turbo_window_ms": cfg.tuner.turbo_window_ms,
                "turbo_streak": cfg.tuner.turbo_streak,
                "multiplier_ref_ms": cfg.tuner.multiplier_ref_ms,
                "multiplier_floor_ms": cfg.tuner.multiplier_floor_ms,
                "multiplier_max": cfg.tuner.multiplier_max,
            },
            "estimator": { "alpha_per_second": cfg.estimator.alpha_per_second },
        });
        println!("{obj}");
        return;
    }
    println!(
        "band:      {} [{:.0} .. {:.0}] Hz, start {:.0} Hz",
        cfg.band.label, cfg.band.f_min_hz, cfg.band.f_max_hz, cfg.band.start_hz
    );
    println!("ladder:    steps {:?} Hz", cfg.ladder.steps_hz);
    println!("           up    {:?} ms", cfg.ladder.up_ms);
    println!("           down  {:?} ms", cfg.ladder.down_ms);
    println!(
        "encoder:   divisor {}, debounce {} ms",
        cfg.encoder.detent_divisor, cfg.encoder.debounce_ms
    );
    println!(
        "tuner:     idle reset {} ms, turbo {}x < {} ms -> {} ms window, multiplier 1..{} (ref {} ms)",
        cfg.tuner.idle_reset_ms,
        cfg.tuner.turbo_streak,
        cfg.tuner.turbo_idi_ms,
        cfg.tuner.turbo_window_ms,
        cfg.tuner.multiplier_max,
        cfg.tuner.multiplier_ref_ms
    );
    println!("estimator: alpha {}/s", cfg.estimator.alpha_per_second);
}

fn print_sim_outcome(outcome: &sim::SimOutcome, json: bool) {
    if json {
        let obj = serde_json::json!({
            "event": "sim",
            "start_hz": outcome.start_hz,
            "final_hz": outcome.final_hz,
            "delta_hz": outcome.final_hz - outcome.start_hz,
            "step_rung": outcome.step_rung,
            "cursor_digit": outcome.cursor_digit,
            "detent_rate": outcome.detent_rate,
            "display_frames": outcome.display_frames,
        });
        println!("{obj}");
        return;
    }
    println!("start: {:>12.0} Hz", outcome.start_hz);
    println!(
        "final: {:>12.0} Hz ({:+.0} Hz)",
        outcome.final_hz,
        outcome.final_hz - outcome.start_hz
    );
    println!(
        "rung {}, cursor digit {}, detent rate {:.1}/s, {} display frames",
        outcome.step_rung, outcome.cursor_digit, outcome.detent_rate, outcome.display_frames
    );
}

fn run(args: &Cli, cfg: &vfo_config::Config, json: bool) -> Result<()> {
    match &args.cmd {
        Commands::CheckConfig => {
            print_check_config(cfg, json);
            Ok(())
        }
        Commands::Sim {
            detents,
            interval_ms,
            reverse,
            presses,
            dwell_ms,
            live,
        } => {
            let outcome = sim::run_sim(
                cfg,
                &SimArgs {
                    detents: *detents,
                    interval_ms: *interval_ms,
                    reverse: *reverse,
                    presses: *presses,
                    dwell_ms: *dwell_ms,
                    live: *live,
                },
            )?;
            print_sim_outcome(&outcome, json);
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let (cfg, config_loaded) = match load_config(&args.config) {
        Ok(v) => v,
        Err(err) => {
            let _ = JSON_MODE.set(args.json);
            init_logging(args.json, &args.log_level, args.log_file.as_deref())?;
            error_fmt::report(&err);
            std::process::exit(1);
        }
    };

    // CLI flags win over the [logging] section of the config.
    let json = args.json || cfg.logging.json;
    let level = if args.log_level == "info" {
        cfg.logging.level.clone().unwrap_or_else(|| "info".into())
    } else {
        args.log_level.clone()
    };
    let log_file = args
        .log_file
        .clone()
        .or_else(|| cfg.logging.file.as_ref().map(PathBuf::from));
    let _ = JSON_MODE.set(json);
    init_logging(json, &level, log_file.as_deref())?;
    if config_loaded {
        tracing::info!(path = %args.config.display(), "config loaded");
    } else {
        tracing::warn!(path = %args.config.display(), "config not found; using built-in defaults");
    }

    if let Err(err) = run(&args, &cfg, json) {
        error_fmt::report(&err);
        std::process::exit(1);
    }
    Ok(())
}
