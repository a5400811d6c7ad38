//! Lock-free handoff between interrupt context and the polling loop.
//!
//! Every field has exactly one writer role (interrupt context) and one
//! reader-and-resetter role (the polling loop), so plain atomics suffice.
//! Coalescing is intentionally lossy: same-direction ticks within one poll
//! interval merge into a net count and a reversal partially cancels. The
//! tuner only needs the net movement and its timing, not an event replay.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};

use crate::decoder::Direction;

/// Shared event state owned by the application, published from interrupt
/// handlers and drained by the polling loop.
#[derive(Debug, Default)]
pub struct SharedEventQueue {
    /// Net decoded ticks since the last drain.
    ticks: AtomicI32,
    /// Deadline (ms since epoch) for the pending switch confirmation;
    /// 0 means none pending.
    confirm_at_ms: AtomicU64,
    /// One-shot confirmed-press event.
    press: AtomicBool,
}

impl SharedEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt side: record one decoded tick.
    #[inline]
    pub fn publish_tick(&self, dir: Direction) {
        self.ticks.fetch_add(dir.delta(), Ordering::Relaxed);
    }

    /// Polling side: take the accumulated net tick count and reset it to zero
    /// in one atomic exchange.
    #[inline]
    pub fn drain_ticks(&self) -> i32 {
        self.ticks.swap(0, Ordering::AcqRel)
    }

    /// Interrupt side: (re-)arm the delayed switch confirmation. Repeated
    /// edges overwrite the deadline; the confirmation is level-based, so
    /// re-arming is idempotent.
    #[inline]
    pub fn schedule_confirm(&self, deadline_ms: u64) {
        // 0 is the "none pending" sentinel.
        self.confirm_at_ms.store(deadline_ms.max(1), Ordering::Release);
    }

    /// Polling side: returns true once the pending confirmation deadline has
    /// passed, clearing it. Returns false while none is pending or not due.
    pub fn take_due_confirm(&self, now_ms: u64) -> bool {
        let due = self.confirm_at_ms.load(Ordering::Acquire);
        if due == 0 || now_ms < due {
            return false;
        }
        // Only clear if the deadline was not re-armed in between; a fresh
        // edge moves the confirmation later, which is exactly what a
        // still-bouncing contact needs.
        self.confirm_at_ms
            .compare_exchange(due, 0, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Publish the one-shot confirmed-press event.
    #[inline]
    pub fn publish_press(&self) {
        self.press.store(true, Ordering::Release);
    }

    /// Polling side: consume the press event exactly once.
    #[inline]
    pub fn take_press(&self) -> bool {
        self.press.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_coalesce_and_cancel() {
        let q = SharedEventQueue::new();
        q.publish_tick(Direction::Cw);
        q.publish_tick(Direction::Cw);
        q.publish_tick(Direction::Ccw);
        assert_eq!(q.drain_ticks(), 1);
        assert_eq!(q.drain_ticks(), 0);
    }

    #[test]
    fn confirm_fires_once_after_deadline() {
        let q = SharedEventQueue::new();
        q.schedule_confirm(50);
        assert!(!q.take_due_confirm(49));
        assert!(q.take_due_confirm(50));
        assert!(!q.take_due_confirm(51));
    }

    #[test]
    fn rearming_moves_the_deadline() {
        let q = SharedEventQueue::new();
        q.schedule_confirm(50);
        q.schedule_confirm(80);
        assert!(!q.take_due_confirm(60));
        assert!(q.take_due_confirm(80));
    }

    #[test]
    fn press_is_consumed_exactly_once() {
        let q = SharedEventQueue::new();
        q.publish_press();
        assert!(q.take_press());
        assert!(!q.take_press());
    }

    #[test]
    fn zero_deadline_never_confuses_the_sentinel() {
        let q = SharedEventQueue::new();
        q.schedule_confirm(0);
        // Clamped to 1, still a real pending confirmation.
        assert!(q.take_due_confirm(1));
    }
}
