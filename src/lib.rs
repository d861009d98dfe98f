//! REELPLAY - Reel player coordinator library
//!
//! Keeps exactly one video playing in a carousel of shoppable reels: one
//! slide index, one player handle per mounted slide, and a coordinator that
//! pauses and mutes every handle except the active one.

// Core engine (index, registry, coordinator, events)
pub mod core;

// Input adapters and item sources
pub mod input;
pub mod source;

// App modules
pub mod cli;
pub mod config;
pub mod layout;
pub mod session;

// Re-export commonly used types from core
pub use core::event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use core::{
    IndexStore, PlaybackCoordinator, PlaybackState, PlayerError, PlayerRegistry, PlayerSdk,
    ReelPlayer, ScriptedSdk, Surface, SurfaceId,
};

pub use input::NavAction;
pub use layout::LayoutMode;
pub use session::ReelSession;
pub use source::{ReelItem, ReelSource};
