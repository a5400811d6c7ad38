//! Scripted encoder pump.
//!
//! Replays operator gestures (spins, presses, pauses) as the raw edge
//! sequences a mechanical encoder would produce, against any
//! [`vfo_traits::EdgeSink`]. A background thread consumes scripted steps
//! from a bounded channel so the polling loop sees the same asynchronous
//! arrival pattern it would get from pin-change interrupts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use vfo_traits::{Clock, EdgeSink};

/// Spin direction of a scripted gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinDirection {
    Cw,
    Ccw,
}

/// One scripted operator gesture.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Turn the knob `detents` clicks with the given inter-detent interval.
    Spin {
        detents: u32,
        direction: SpinDirection,
        interval: Duration,
    },
    /// Tap the encoder switch.
    Press,
    /// Keep the knob still.
    Dwell(Duration),
}

// Pin levels (a, b) for the forward Gray walk 0 -> 2 -> 3 -> 1 -> 0.
const CW_EDGES: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];
const CCW_EDGES: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];

/// Replay one gesture synchronously against `sink`, pacing via `clock`.
///
/// Each detent is four quadrature edges; the inter-detent interval elapses
/// before the edges, so the first detent of a spin carries the gap since
/// whatever came before it.
pub fn play_step<S: EdgeSink + ?Sized>(sink: &mut S, clock: &dyn Clock, step: &ScriptStep) {
    match step {
        ScriptStep::Spin {
            detents,
            direction,
            interval,
        } => {
            let edges = match direction {
                SpinDirection::Cw => CW_EDGES,
                SpinDirection::Ccw => CCW_EDGES,
            };
            for _ in 0..*detents {
                clock.sleep(*interval);
                for (a, b) in edges {
                    sink.quadrature_edge(a, b);
                }
            }
        }
        ScriptStep::Press => sink.switch_edge(),
        ScriptStep::Dwell(d) => clock.sleep(*d),
    }
}

/// Replay a whole script synchronously. Used by tests and the CLI simulator
/// when deterministic, single-threaded replay is enough.
pub fn play_script<S: EdgeSink + ?Sized>(sink: &mut S, clock: &dyn Clock, steps: &[ScriptStep]) {
    for step in steps {
        play_step(sink, clock, step);
    }
}

/// Background pump: owns the sink on its own thread and replays steps as
/// they arrive. Dropping the pump stops it and joins the thread.
pub struct EncoderPump {
    tx: Option<Sender<ScriptStep>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EncoderPump {
    /// Spawn the pump thread. `capacity` bounds the scripted backlog so a
    /// fast producer blocks instead of queueing unbounded gestures.
    pub fn spawn<S>(mut sink: S, clock: Arc<dyn Clock + Send + Sync>, capacity: usize) -> Self
    where
        S: EdgeSink + 'static,
    {
        let (tx, rx): (Sender<ScriptStep>, Receiver<ScriptStep>) = bounded(capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("encoder-pump".into())
            .spawn(move || {
                loop {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    match rx.recv_timeout(Duration::from_millis(20)) {
                        Ok(step) => play_step(&mut sink, clock.as_ref(), &step),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("encoder pump stopped");
            })
            .ok();
        Self {
            tx: Some(tx),
            shutdown,
            handle,
        }
    }

    /// Queue one gesture. Returns false once the pump thread is gone.
    pub fn enqueue(&self, step: ScriptStep) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.send(step).is_ok())
    }

    /// Close the script channel, let the backlog finish, and join.
    pub fn finish(mut self) {
        self.tx = None; // disconnects the channel
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EncoderPump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.tx = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
