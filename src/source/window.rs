//! Windowed item growth.
//!
//! Only a prefix of the fetched list is mounted: the first `initial` items,
//! then enough to keep one slide ahead of the viewer. Moving back never
//! shrinks the window, so already-mounted slides stay mounted.

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReelWindow {
    total: usize,
    loaded: usize,
    initial: usize,
}

impl Default for ReelWindow {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ReelWindow {
    pub fn new(initial: usize) -> Self {
        Self {
            total: 0,
            loaded: 0,
            initial: initial.max(1),
        }
    }

    /// New list of `total` items
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.loaded = self.initial.min(total);
    }

    /// Number of items currently exposed
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Viewer moved to `index`. Returns true if the window grew.
    pub fn on_index(&mut self, index: usize) -> bool {
        let wanted = if index < self.initial {
            self.initial
        } else {
            // Current slide plus one ahead
            index + 2
        };
        self.grow_to(wanted)
    }

    /// Expose exactly one more item. Returns false at the end of the list.
    pub fn append_next(&mut self) -> bool {
        self.grow_to(self.loaded + 1)
    }

    fn grow_to(&mut self, count: usize) -> bool {
        let count = count.min(self.total);
        if count <= self.loaded {
            return false;
        }
        trace!("ReelWindow: {} -> {} of {}", self.loaded, count, self.total);
        self.loaded = count;
        true
    }

    /// Slice of `items` inside the window
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.loaded.min(items.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_window() {
        let mut w = ReelWindow::new(3);
        w.reset(10);
        assert_eq!(w.loaded(), 3);
        w.reset(2);
        assert_eq!(w.loaded(), 2);
        w.reset(0);
        assert_eq!(w.loaded(), 0);
    }

    #[test]
    fn test_grows_ahead_never_shrinks() {
        let mut w = ReelWindow::new(3);
        w.reset(10);
        assert!(!w.on_index(1));
        assert!(w.on_index(3));
        assert_eq!(w.loaded(), 5);
        assert!(!w.on_index(0));
        assert_eq!(w.loaded(), 5);
        assert!(w.on_index(9));
        assert_eq!(w.loaded(), 10);
    }

    #[test]
    fn test_append_next() {
        let mut w = ReelWindow::new(3);
        w.reset(4);
        assert!(w.append_next());
        assert_eq!(w.loaded(), 4);
        assert!(!w.append_next());
    }

    #[test]
    fn test_visible_slice() {
        let mut w = ReelWindow::new(2);
        let items = ["a", "b", "c"];
        w.reset(items.len());
        assert_eq!(w.visible(&items), &["a", "b"]);
    }
}
