//! Switch debounce confirmation.
//!
//! The interrupt side only schedules a delayed confirmation (see
//! `SharedEventQueue::schedule_confirm`); the real decision happens here,
//! ~50 ms later, against the pin level read *at confirmation time*. The
//! timer can fire long after the contact settled or even after it released
//! again, so the latch trusts only the live level, never the state at
//! scheduling time.

/// Level-based two-state latch applied by the delayed confirmation check.
///
/// Not edge-counted: however many redundant confirmations arrive, a held
/// switch produces exactly one press event until it is released.
#[derive(Debug, Default)]
pub struct SwitchDebouncer {
    pressed_latched: bool,
}

impl SwitchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one confirmation with the live pin level. Returns true when
    /// this confirmation produced a new press event.
    pub fn confirm(&mut self, pressed_level: bool) -> bool {
        if pressed_level && !self.pressed_latched {
            self.pressed_latched = true;
            return true;
        }
        if !pressed_level && self.pressed_latched {
            self.pressed_latched = false;
        }
        false
    }

    /// Current latch state.
    pub fn is_latched(&self) -> bool {
        self.pressed_latched
    }
}
