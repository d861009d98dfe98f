//! Session events published on the [`EventBus`](super::event_bus::EventBus).
//!
//! UI glue subscribes to these instead of polling session state.

use crate::layout::LayoutMode;

/// Where a navigation came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Press,
    Swipe,
    /// Thumbnail / dot click or programmatic jump
    Direct,
}

// === Navigation ===

#[derive(Clone, Debug, PartialEq)]
pub struct SlideChangedEvent {
    pub index: usize,
    pub total: usize,
    pub source: InputSource,
}

/// Ask the swipe widget to move to `0` (store changed from another input)
#[derive(Clone, Debug, PartialEq)]
pub struct SlideToEvent(pub usize);

/// Visible window of items grew to `0` entries
#[derive(Clone, Debug, PartialEq)]
pub struct WindowGrewEvent(pub usize);

// === Playback ===

#[derive(Clone, Debug, PartialEq)]
pub struct MuteChangedEvent(pub bool);

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackToggledEvent {
    pub index: usize,
    pub playing: bool,
}

// === Modal / layout ===

#[derive(Clone, Debug, PartialEq)]
pub struct ModalOpenedEvent(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub struct ModalClosedEvent;

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutChangedEvent(pub LayoutMode);

#[derive(Clone, Debug, PartialEq)]
pub struct ItemsLoadedEvent(pub usize);
