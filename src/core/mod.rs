//! Core engine - index store, player registry, playback coordination, events
//!
//! These modules know nothing about the page; the session and the driver
//! binary feed them input and surfaces.

pub mod cooldown;
pub mod coordinator;
pub mod event_bus;
pub mod events;
pub mod index_store;
pub mod registry;
pub mod scripted;
pub mod sdk;

// Re-exports for convenience
pub use cooldown::Cooldown;
pub use coordinator::{PlaybackCoordinator, PlaybackState};
pub use event_bus::{EventBus, EventEmitter};
pub use index_store::IndexStore;
pub use registry::{PlayerHandle, PlayerRegistry};
pub use scripted::ScriptedSdk;
pub use sdk::{PlayerError, PlayerSdk, ReelPlayer, SdkLoader, Surface, SurfaceId};
