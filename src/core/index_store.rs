//! Selected slide index.
//!
//! Knows nothing about players. Navigation wraps around the list ends
//! (infinite loop browsing); before a list is loaded every call is a no-op.

use log::trace;

/// Currently selected slide, `None` until a list is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStore {
    current: Option<usize>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Advance by one modulo `total`. Returns the new index, `None` on no-op.
    pub fn next(&mut self, total: usize) -> Option<usize> {
        self.step(total, 1)
    }

    /// Retreat by one modulo `total`. Returns the new index, `None` on no-op.
    pub fn prev(&mut self, total: usize) -> Option<usize> {
        self.step(total, -1)
    }

    fn step(&mut self, total: usize, delta: isize) -> Option<usize> {
        if total == 0 {
            return None;
        }
        // Not positioned yet: first step lands on the first slide
        let Some(current) = self.current else {
            self.current = Some(0);
            return self.current;
        };
        let total_i = total as isize;
        let from = (current % total) as isize;
        let next = (from + delta).rem_euclid(total_i) as usize;
        trace!("IndexStore: {} -> {} (total {})", current, next, total);
        self.current = Some(next);
        self.current
    }

    /// Absolute jump (dot/thumbnail click, swipe widget sync)
    pub fn set(&mut self, index: usize) {
        self.current = Some(index);
    }

    /// Position for a freshly loaded list of `total` items
    pub fn reset(&mut self, total: usize) {
        self.current = if total > 0 { Some(0) } else { None };
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
