//! Input cooldown gate.
//!
//! Navigation input can arrive faster than players are torn down and set up
//! (held arrow key, frantic tapping). After an accepted action the gate stays
//! closed for a fixed window; everything inside the window is dropped, not
//! queued.
//!
//! Unlike a debounce, the *first* event wins and the timer is not extended by
//! rejected events.

use std::time::{Duration, Instant};

/// Leading-edge cooldown gate.
///
/// # Usage
/// ```ignore
/// if cooldown.try_acquire() {
///     store.next(total);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Cooldown {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(500)
    }
}

impl Cooldown {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            last_accepted: None,
        }
    }

    pub fn set_window(&mut self, window_ms: u64) {
        self.window = Duration::from_millis(window_ms);
    }

    pub fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }

    /// Accept an action now if the gate is open.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Accept an action at `now` if the gate is open. Closes the gate on success.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if self.is_cooling_at(now) {
            log::trace!("Cooldown: rejected ({}ms window)", self.window.as_millis());
            return false;
        }
        self.last_accepted = Some(now);
        true
    }

    /// Gate closed at `now`
    pub fn is_cooling_at(&self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) => now.saturating_duration_since(last) < self.window,
            None => false,
        }
    }

    /// Reopen immediately (modal closed, input source changed)
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
