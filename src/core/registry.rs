//! Player registry: slide index -> live player handle.
//!
//! A handle lives exactly as long as its surface is mounted. Dropping a
//! handle tears the player down (pause, mute, destroy), so `unregister()`
//! and `clear()` are just removals.
//!
//! Every handle is stamped with a registry-wide generation. Ready callbacks
//! carry the generation they were issued for; a callback whose generation no
//! longer matches the handle at that index is for a player that is already
//! gone and is dropped.

use indexmap::IndexMap;
use log::{debug, trace, warn};

use super::sdk::{PlayerError, PlayerSdk, ReelPlayer, Surface};

/// Live player bound to one mounted surface
pub struct PlayerHandle {
    index: usize,
    generation: u64,
    surface: Surface,
    ready: bool,
    player: Box<dyn ReelPlayer>,
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .field("surface", &self.surface)
            .field("ready", &self.ready)
            .finish()
    }
}

impl PlayerHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Ready handshake done - commands may be issued
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn play(&mut self) -> Result<(), PlayerError> {
        self.player.play()
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        self.player.pause()
    }

    pub fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.player.set_muted(muted)
    }

    pub fn set_current_time(&mut self, seconds: f64) -> Result<(), PlayerError> {
        self.player.set_current_time(seconds)
    }

    pub fn is_paused(&self) -> Result<bool, PlayerError> {
        self.player.is_paused()
    }

    pub fn is_muted(&self) -> Result<bool, PlayerError> {
        self.player.is_muted()
    }

    /// Pause + mute, stop at first failure
    pub fn idle(&mut self) -> Result<(), PlayerError> {
        self.player.pause()?;
        self.player.set_muted(true)
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        // Silence first; failures here mean the surface is already gone
        if self.ready {
            let _ = self.player.pause();
            let _ = self.player.set_muted(true);
        }
        self.player.destroy();
        trace!(
            "PlayerHandle: slide {} gen {} torn down",
            self.index, self.generation
        );
    }
}

/// Slide index -> handle map, owning the SDK that creates players
pub struct PlayerRegistry {
    sdk: Box<dyn PlayerSdk>,
    handles: IndexMap<usize, PlayerHandle>,
    next_generation: u64,
}

impl PlayerRegistry {
    pub fn new(sdk: Box<dyn PlayerSdk>) -> Self {
        Self {
            sdk,
            handles: IndexMap::new(),
            next_generation: 1,
        }
    }

    pub fn sdk_ready(&self) -> bool {
        self.sdk.is_ready()
    }

    /// Bind `surface` to a player for slide `index`.
    ///
    /// - same surface already registered: the existing handle is reused
    /// - different surface at that index: old handle torn down first
    /// - SDK not loaded or player construction failed: `None`, caller retries
    ///   on the next mount / SDK-ready signal
    pub fn register(&mut self, index: usize, surface: Surface) -> Option<&PlayerHandle> {
        if self
            .handles
            .get(&index)
            .is_some_and(|h| h.surface == surface)
        {
            trace!("Registry: slide {} already bound to {}", index, surface.id);
            return self.handles.get(&index);
        }

        // Replace: teardown happens before the new player exists
        self.unregister(index);

        if !self.sdk.is_ready() {
            debug!("Registry: SDK not ready, slide {} deferred", index);
            return None;
        }

        let player = match self.sdk.create(&surface) {
            Ok(p) => p,
            Err(e) => {
                warn!("Registry: player init for slide {} failed: {}", index, e);
                return None;
            }
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        let ready = player.is_ready();
        debug!(
            "Registry: slide {} -> {} gen {} (ready: {})",
            index, surface.id, generation, ready
        );

        self.handles.insert(
            index,
            PlayerHandle {
                index,
                generation,
                surface,
                ready,
                player,
            },
        );
        self.handles.get(&index)
    }

    /// Tear down the handle at `index`. Idempotent; returns whether one existed.
    pub fn unregister(&mut self, index: usize) -> bool {
        match self.handles.shift_remove(&index) {
            Some(handle) => {
                debug!("Registry: slide {} gen {} unregistered", index, handle.generation);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&PlayerHandle> {
        self.handles.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PlayerHandle> {
        self.handles.get_mut(&index)
    }

    /// Mark the handle ready if `generation` is still the live one at `index`.
    pub fn mark_ready(&mut self, index: usize, generation: u64) -> bool {
        match self.handles.get_mut(&index) {
            Some(h) if h.generation == generation => {
                h.ready = true;
                true
            }
            Some(h) => {
                trace!(
                    "Registry: stale ready for slide {} (gen {} != live {})",
                    index, generation, h.generation
                );
                false
            }
            None => {
                trace!("Registry: ready for unmounted slide {} ignored", index);
                false
            }
        }
    }

    /// Tear down every handle. Idempotent.
    pub fn clear(&mut self) {
        if !self.handles.is_empty() {
            debug!("Registry: clearing {} handles", self.handles.len());
        }
        // Drain so teardown runs in mount order
        for (_, handle) in self.handles.drain(..) {
            drop(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Registered indices in mount order
    pub fn indices(&self) -> Vec<usize> {
        self.handles.keys().copied().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&usize, &mut PlayerHandle)> {
        self.handles.iter_mut()
    }
}

impl std::fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerRegistry")
            .field("handles", &self.handles)
            .field("next_generation", &self.next_generation)
            .finish()
    }
}
