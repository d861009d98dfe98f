//! Player SDK seam - the only surface the coordinator talks to.
//!
//! Third-party players disagree on method names (`mute()` vs `setMuted()`),
//! on how state is queried (callbacks vs promises) and on what exists at all.
//! Every SDK is wrapped behind [`ReelPlayer`] once, at construction time, so
//! the coordinator never probes for capabilities at runtime.
//!
//! # Lifecycle
//!
//! ```text
//! SdkLoader: Idle -> Loading -> Ready
//!                           \-> Failed (retry allowed via ensure_loaded)
//!
//! PlayerSdk::create(surface) -> Box<dyn ReelPlayer>
//!   player.is_ready() == false  => wait for ready callback (generation-checked)
//!   player.is_ready() == true   => commands may be issued immediately
//! ```

use log::{debug, trace, warn};

/// Identity of a mounted video surface (iframe / embedded element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// A mounted video surface a player can be bound to.
///
/// Two surfaces are the same surface only if both the id and the source match;
/// a remount with a new source is a different surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub id: SurfaceId,
    pub src: String,
}

impl Surface {
    pub fn new(id: u64, src: impl Into<String>) -> Self {
        Self {
            id: SurfaceId(id),
            src: src.into(),
        }
    }
}

/// Player command errors
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// Surface was torn down underneath the player (race with unmount)
    Stale,
    /// SDK script not loaded yet
    NotReady,
    /// Any other SDK-reported failure
    Sdk(String),
}

impl std::fmt::Display for PlayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerError::Stale => write!(f, "Player surface is gone"),
            PlayerError::NotReady => write!(f, "Player SDK not ready"),
            PlayerError::Sdk(e) => write!(f, "Player SDK error: {}", e),
        }
    }
}

impl std::error::Error for PlayerError {}

/// Capability set every wrapped player guarantees.
///
/// Commands are idempotent by contract: muting a muted player or pausing a
/// paused one is legal and cheap.
pub trait ReelPlayer {
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError>;
    fn set_current_time(&mut self, seconds: f64) -> Result<(), PlayerError>;
    fn is_paused(&self) -> Result<bool, PlayerError>;
    fn is_muted(&self) -> Result<bool, PlayerError>;

    /// True once the player accepted its "ready" handshake.
    /// Players that are usable right after construction return true.
    fn is_ready(&self) -> bool {
        true
    }

    /// Release SDK-side resources. Called exactly once on teardown.
    fn destroy(&mut self) {}
}

/// Factory for players, backed by a loaded SDK script.
pub trait PlayerSdk {
    /// SDK script loaded and constructor available
    fn is_ready(&self) -> bool;

    /// Bind a new player to a mounted surface.
    fn create(&mut self, surface: &Surface) -> Result<Box<dyn ReelPlayer>, PlayerError>;
}

/// Load state of the process-wide SDK script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// What a mount site should do after asking the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    /// Caller must inject the script now (first request, or retry after failure)
    Start,
    /// Script already requested by someone else - wait for the ready signal
    Pending,
    /// Script available - proceed to register players
    Ready,
}

/// One-time, idempotent SDK script loader.
///
/// Any number of slides may mount before the script arrives; only the first
/// `ensure_loaded()` gets `Start`, everybody else gets `Pending` until
/// `on_loaded()` flips the state to `Ready`.
#[derive(Debug, Clone, Default)]
pub struct SdkLoader {
    state: LoadState,
    script_url: String,
}

impl SdkLoader {
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            state: LoadState::Idle,
            script_url: script_url.into(),
        }
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    /// Ask for the SDK. Returns what the caller has to do.
    pub fn ensure_loaded(&mut self) -> LoadRequest {
        match self.state {
            LoadState::Ready => LoadRequest::Ready,
            LoadState::Loading => LoadRequest::Pending,
            LoadState::Idle | LoadState::Failed(_) => {
                debug!("SdkLoader: requesting {}", self.script_url);
                self.state = LoadState::Loading;
                LoadRequest::Start
            }
        }
    }

    /// Script load callback. Returns true on the first transition to Ready.
    pub fn on_loaded(&mut self) -> bool {
        if self.state == LoadState::Ready {
            trace!("SdkLoader: duplicate load signal ignored");
            return false;
        }
        debug!("SdkLoader: {} ready", self.script_url);
        self.state = LoadState::Ready;
        true
    }

    /// Script error callback. A later `ensure_loaded()` retries.
    pub fn on_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("SdkLoader: failed to load {}: {}", self.script_url, reason);
        self.state = LoadState::Failed(reason);
    }
}
