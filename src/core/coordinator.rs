//! Playback coordinator - the single authority over player commands.
//!
//! **Invariant**: after any sync completes, at most one handle is playing
//! and unmuted (zero when the global mute flag is on). Every other handle is
//! paused and muted.
//!
//! # Sync order
//!
//! ```text
//! sync_to_index(i):
//!   1. for h in handles, h.index != i:  pause, mute      (always issued)
//!   2. h = handles[i] if present and ready:
//!        fresh activation? -> seek 0
//!        apply mute flag
//!        play
//!   3. no ready handle at i -> deferred; on_mount / on_player_ready for i
//!      re-enter sync_to_index(i)
//! ```
//!
//! Outgoing handles are silenced strictly before the incoming one starts, so
//! there is no window with two audible players.
//!
//! # Fresh activation
//!
//! A handle is reset to position 0 the first time it is synced after its
//! slide *became* active. Re-syncing the same active slide (swipe widget
//! echo, remount of a sibling) does not restart it; leaving and coming back
//! (A -> B -> A) does.
//!
//! # Failures
//!
//! A command failing with anything is treated as "surface gone": the handle
//! is unregistered after the pass. Nothing here returns an error.

use log::{debug, trace, warn};

use super::registry::{PlayerHandle, PlayerRegistry};
use super::sdk::{PlayerError, Surface};

/// Derived per-slide playback state (for UI indicators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No player bound to the slide
    Uninitialized,
    /// Player created, waiting for its ready handshake
    Pending,
    Ready {
        paused: bool,
        muted: bool,
        active: bool,
    },
}

pub struct PlaybackCoordinator {
    registry: PlayerRegistry,
    muted: bool,
    active: Option<usize>,
    /// Generation of the handle that received the current slide's activation
    activated_generation: Option<u64>,
}

impl PlaybackCoordinator {
    pub fn new(registry: PlayerRegistry, muted: bool) -> Self {
        Self {
            registry,
            muted,
            active: None,
            activated_generation: None,
        }
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Make `active` the only playing slide.
    pub fn sync_to_index(&mut self, active: usize) {
        if self.active != Some(active) {
            trace!("Coordinator: active {:?} -> {}", self.active, active);
            self.active = Some(active);
            self.activated_generation = None;
        }

        let mut stale = Vec::new();

        // 1. Silence everything else first
        for (&idx, handle) in self.registry.iter_mut() {
            if idx == active || !handle.is_ready() {
                continue;
            }
            if let Err(e) = handle.idle() {
                warn!("Coordinator: slide {} stale while idling: {}", idx, e);
                stale.push(idx);
            }
        }

        // 2. Start the incoming one
        let muted = self.muted;
        let mut activated = None;
        match self.registry.get_mut(active) {
            Some(handle) if handle.is_ready() => {
                let fresh = self.activated_generation != Some(handle.generation());
                match Self::activate(handle, fresh, muted) {
                    Ok(()) => activated = Some(handle.generation()),
                    Err(e) => {
                        warn!("Coordinator: slide {} stale while activating: {}", active, e);
                        stale.push(active);
                    }
                }
            }
            Some(_) => trace!("Coordinator: slide {} not ready, deferred", active),
            None => trace!("Coordinator: slide {} not mounted, deferred", active),
        }
        if activated.is_some() {
            self.activated_generation = activated;
        }

        self.drop_stale(stale);
    }

    fn activate(handle: &mut PlayerHandle, fresh: bool, muted: bool) -> Result<(), PlayerError> {
        if fresh {
            handle.set_current_time(0.0)?;
        }
        handle.set_muted(muted)?;
        handle.play()?;
        debug!(
            "Coordinator: slide {} playing (fresh: {}, muted: {})",
            handle.index(),
            fresh,
            muted
        );
        Ok(())
    }

    /// Apply the mute flag to the active handle only. Never seeks, plays or
    /// pauses - toggling mute must not restart the video.
    pub fn sync_mute_only(&mut self) {
        let Some(active) = self.active else {
            return;
        };
        let muted = self.muted;
        let failed = match self.registry.get_mut(active) {
            Some(handle) if handle.is_ready() => handle.set_muted(muted).err(),
            _ => None,
        };
        if let Some(e) = failed {
            warn!("Coordinator: slide {} stale while muting: {}", active, e);
            self.drop_stale(vec![active]);
        }
    }

    /// Set the global mute flag and apply it.
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        self.sync_mute_only();
    }

    /// Flip the global mute flag. Returns the new value.
    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    /// Overlay tap: play if paused, pause if playing. Position and mute untouched.
    /// Returns `Some(playing)` when a command was issued.
    pub fn toggle_play_pause(&mut self) -> Option<bool> {
        let active = self.active?;
        let handle = self.registry.get_mut(active)?;
        if !handle.is_ready() {
            return None;
        }
        let result = handle.is_paused().and_then(|paused| {
            if paused {
                handle.play().map(|_| true)
            } else {
                handle.pause().map(|_| false)
            }
        });
        match result {
            Ok(playing) => Some(playing),
            Err(e) => {
                warn!("Coordinator: slide {} stale while toggling: {}", active, e);
                self.drop_stale(vec![active]);
                None
            }
        }
    }

    /// Surface for slide `index` mounted. Registers it and, if it is the
    /// active slide, syncs immediately. Returns whether a handle exists now.
    pub fn on_mount(&mut self, index: usize, surface: Surface) -> bool {
        let ready = match self.registry.register(index, surface) {
            Some(handle) => handle.is_ready(),
            None => return false,
        };
        if ready {
            self.settle(index);
        }
        true
    }

    /// Ready handshake for the player stamped `generation`. Stale callbacks
    /// (handle replaced or unmounted in between) are dropped.
    pub fn on_player_ready(&mut self, index: usize, generation: u64) -> bool {
        if !self.registry.mark_ready(index, generation) {
            return false;
        }
        self.settle(index);
        true
    }

    /// Bring a newly usable handle into its correct state.
    fn settle(&mut self, index: usize) {
        if self.active == Some(index) {
            self.sync_to_index(index);
            return;
        }
        let failed = self
            .registry
            .get_mut(index)
            .and_then(|h| h.idle().err());
        if let Some(e) = failed {
            warn!("Coordinator: slide {} stale on settle: {}", index, e);
            self.drop_stale(vec![index]);
        }
    }

    /// Surface for slide `index` unmounted.
    pub fn on_unmount(&mut self, index: usize) {
        self.registry.unregister(index);
    }

    /// Pause and mute every ready handle, keep them registered.
    pub fn pause_all(&mut self) {
        let mut stale = Vec::new();
        for (&idx, handle) in self.registry.iter_mut() {
            if handle.is_ready() && handle.idle().is_err() {
                stale.push(idx);
            }
        }
        self.drop_stale(stale);
    }

    /// Tear down every handle (layout flip, modal close). The active index is
    /// kept; the next mount of that slide starts fresh.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.activated_generation = None;
    }

    /// Forget the active slide entirely.
    pub fn deactivate(&mut self) {
        self.active = None;
        self.activated_generation = None;
    }

    pub fn playback_state(&mut self, index: usize) -> PlaybackState {
        let active = self.active == Some(index);
        let Some(handle) = self.registry.get(index) else {
            return PlaybackState::Uninitialized;
        };
        if !handle.is_ready() {
            return PlaybackState::Pending;
        }
        match (handle.is_paused(), handle.is_muted()) {
            (Ok(paused), Ok(muted)) => PlaybackState::Ready {
                paused,
                muted,
                active,
            },
            _ => {
                self.drop_stale(vec![index]);
                PlaybackState::Uninitialized
            }
        }
    }

    fn drop_stale(&mut self, stale: Vec<usize>) {
        for idx in stale {
            self.registry.unregister(idx);
            if self.active == Some(idx) {
                self.activated_generation = None;
            }
        }
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("active", &self.active)
            .field("muted", &self.muted)
            .field("handles", &self.registry.indices())
            .finish()
    }
}
