//! Simulated tuning sessions: config mapping, engine assembly, script replay.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::{Result, WrapErr};
use vfo_core::Vfo;
use vfo_hardware::pump::{EncoderPump, ScriptStep, SpinDirection, play_step};
use vfo_hardware::{SimulatedDisplay, SimulatedSynthesizer};
use vfo_traits::{Clock, ManualClock, MonotonicClock};

pub struct SimArgs {
    pub detents: u32,
    pub interval_ms: u64,
    pub reverse: bool,
    pub presses: u32,
    pub dwell_ms: u64,
    pub live: bool,
}

pub struct SimOutcome {
    pub start_hz: f64,
    pub final_hz: f64,
    pub step_rung: usize,
    pub cursor_digit: u32,
    pub detent_rate: f64,
    pub display_frames: usize,
}

fn assemble(
    cfg: &vfo_config::Config,
    clock: Option<ManualClock>,
    switch_level: Arc<AtomicBool>,
) -> Result<(Vfo, SimulatedDisplay)> {
    let display = SimulatedDisplay::new();
    let mut builder = Vfo::builder()
        .with_synthesizer(SimulatedSynthesizer::new())
        .with_display(display.clone())
        .with_switch_check(move || switch_level.load(Ordering::SeqCst))
        .with_config(cfg)?;
    if let Some(clock) = clock {
        builder = builder.with_clock(Box::new(clock));
    }
    let vfo = builder.build()?;
    Ok((vfo, display))
}

pub fn run_sim(cfg: &vfo_config::Config, args: &SimArgs) -> Result<SimOutcome> {
    if args.live {
        run_live(cfg, args)
    } else {
        run_deterministic(cfg, args)
    }
}

/// Deterministic replay on the manual clock: every detent is followed by one
/// poll, so the printed trajectory is reproducible down to the hertz.
fn run_deterministic(cfg: &vfo_config::Config, args: &SimArgs) -> Result<SimOutcome> {
    let clock = ManualClock::new();
    let switch_level = Arc::new(AtomicBool::new(false));
    let (mut vfo, display) = assemble(cfg, Some(clock.clone()), Arc::clone(&switch_level))?;
    vfo.start().wrap_err("start tuning engine")?;
    let start_hz = vfo.frequency_hz();

    let mut fe = vfo.front_end();
    clock.advance_ms(1_000);

    let direction = if args.reverse {
        SpinDirection::Ccw
    } else {
        SpinDirection::Cw
    };
    let interval = Duration::from_millis(args.interval_ms);
    for _ in 0..args.detents {
        play_step(
            &mut fe,
            &clock,
            &ScriptStep::Spin {
                detents: 1,
                direction,
                interval,
            },
        );
        let snap = vfo.poll().wrap_err("poll tuning engine")?;
        tracing::debug!(
            frequency_hz = snap.frequency_hz,
            rung = snap.step_rung,
            "detent applied"
        );
    }

    if args.dwell_ms > 0 {
        clock.advance_ms(args.dwell_ms);
        vfo.poll().wrap_err("poll tuning engine")?;
    }

    let debounce_ms = cfg.encoder.debounce_ms;
    for _ in 0..args.presses {
        switch_level.store(true, Ordering::SeqCst);
        fe.on_switch_edge();
        clock.advance_ms(debounce_ms + 10);
        vfo.poll().wrap_err("poll tuning engine")?;
        switch_level.store(false, Ordering::SeqCst);
        fe.on_switch_edge();
        clock.advance_ms(debounce_ms + 10);
        vfo.poll().wrap_err("poll tuning engine")?;
    }

    Ok(SimOutcome {
        start_hz,
        final_hz: vfo.frequency_hz(),
        step_rung: vfo.step_rung(),
        cursor_digit: vfo.cursor_digit(),
        detent_rate: vfo.detent_rate(),
        display_frames: display.frames().len(),
    })
}

/// Real-time replay: the background pump feeds edges while the main thread
/// polls at a fixed cadence, as the firmware loop would.
fn run_live(cfg: &vfo_config::Config, args: &SimArgs) -> Result<SimOutcome> {
    let switch_level = Arc::new(AtomicBool::new(false));
    let (mut vfo, display) = assemble(cfg, None, switch_level)?;
    vfo.start().wrap_err("start tuning engine")?;
    let start_hz = vfo.frequency_hz();

    if args.presses > 0 {
        tracing::warn!("switch presses are only replayed in deterministic mode; ignoring");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .wrap_err("install Ctrl-C handler")?;
    }

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let pump = EncoderPump::spawn(vfo.front_end(), Arc::clone(&clock), 64);
    let direction = if args.reverse {
        SpinDirection::Ccw
    } else {
        SpinDirection::Cw
    };
    pump.enqueue(ScriptStep::Spin {
        detents: args.detents,
        direction,
        interval: Duration::from_millis(args.interval_ms),
    });
    if args.dwell_ms > 0 {
        pump.enqueue(ScriptStep::Dwell(Duration::from_millis(args.dwell_ms)));
    }

    let budget = Duration::from_millis(
        u64::from(args.detents) * args.interval_ms + args.dwell_ms + 200,
    );
    let started = std::time::Instant::now();
    while started.elapsed() < budget && !shutdown.load(Ordering::SeqCst) {
        vfo.poll().wrap_err("poll tuning engine")?;
        std::thread::sleep(Duration::from_millis(5));
    }
    drop(pump);
    vfo.poll().wrap_err("poll tuning engine")?;

    Ok(SimOutcome {
        start_hz,
        final_hz: vfo.frequency_hz(),
        step_rung: vfo.step_rung(),
        cursor_digit: vfo.cursor_digit(),
        detent_rate: vfo.detent_rate(),
        display_frames: display.frames().len(),
    })
}
