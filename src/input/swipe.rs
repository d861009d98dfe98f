//! Adapter for an external swipe / carousel widget.
//!
//! The widget keeps its own active index. Two directions of sync:
//!
//! - widget -> store: on the widget's slide-change event the widget's index
//!   is authoritative; the session writes it into the index store and syncs
//!   players immediately.
//! - store -> widget: when keyboard/tap/click moved the store, the widget is
//!   asked to `slideTo` once. Its echoing slide-change event then matches the
//!   store and changes nothing.
//!
//! Tracking the widget's last known index is what breaks the feedback loop.

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Forward,
    Backward,
    None,
}

#[derive(Debug, Clone, Default)]
pub struct SwipeAdapter {
    widget_index: Option<usize>,
}

impl SwipeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn widget_index(&self) -> Option<usize> {
        self.widget_index
    }

    /// Widget reported `index` as its active slide. Returns the direction
    /// relative to the widget's previous position.
    pub fn on_slide_change(&mut self, index: usize) -> SwipeDirection {
        let dir = match self.widget_index {
            Some(prev) if index > prev => SwipeDirection::Forward,
            Some(prev) if index < prev => SwipeDirection::Backward,
            Some(_) => SwipeDirection::None,
            None => SwipeDirection::Forward,
        };
        trace!("Swipe: widget {:?} -> {} ({:?})", self.widget_index, index, dir);
        self.widget_index = Some(index);
        dir
    }

    /// Store moved to `store_index` from another input. Returns the index the
    /// widget should slide to, or `None` if it is already there.
    pub fn follow_store(&mut self, store_index: usize) -> Option<usize> {
        if self.widget_index == Some(store_index) {
            return None;
        }
        self.widget_index = Some(store_index);
        Some(store_index)
    }

    /// Widget destroyed (layout flip, modal close)
    pub fn detach(&mut self) {
        self.widget_index = None;
    }
}
