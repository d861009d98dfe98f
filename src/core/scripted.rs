//! In-memory player SDK.
//!
//! Records every command and keeps a tiny model of each player (paused,
//! muted, position) so the driver binary and tests can observe what the
//! coordinator did without a browser. Clones share state.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use super::sdk::{PlayerError, PlayerSdk, ReelPlayer, Surface, SurfaceId};

/// Command as received by a scripted player
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Mute,
    Unmute,
    Seek(f64),
    Destroy,
}

/// Observable state of one scripted player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProbe {
    pub surface: Surface,
    pub paused: bool,
    pub muted: bool,
    pub position: f64,
    pub ready: bool,
    /// Surface torn down under the player - every command fails with Stale
    pub detached: bool,
    pub destroyed: bool,
    pub log: Vec<Command>,
}

impl PlayerProbe {
    fn new(surface: Surface, ready: bool) -> Self {
        Self {
            surface,
            paused: true,
            muted: false,
            position: 0.0,
            ready,
            detached: false,
            destroyed: false,
            log: Vec::new(),
        }
    }

    /// Playing and audible
    pub fn is_audible(&self) -> bool {
        !self.paused && !self.muted && !self.destroyed
    }
}

#[derive(Debug, Default)]
struct SdkState {
    ready: bool,
    auto_ready: bool,
    players: Vec<Rc<RefCell<PlayerProbe>>>,
    /// Every accepted command across all players, in arrival order
    journal: Vec<(SurfaceId, Command)>,
}

/// Scripted SDK (shared handle)
#[derive(Debug, Clone)]
pub struct ScriptedSdk {
    state: Rc<RefCell<SdkState>>,
}

impl Default for ScriptedSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSdk {
    /// Loaded SDK whose players are ready on construction
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SdkState {
                ready: true,
                auto_ready: true,
                players: Vec::new(),
                journal: Vec::new(),
            })),
        }
    }

    /// SDK whose script has not arrived yet
    pub fn not_loaded() -> Self {
        let sdk = Self::new();
        sdk.set_ready(false);
        sdk
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.borrow_mut().ready = ready;
    }

    /// When false, new players wait for `fire_ready()` before accepting commands
    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.state.borrow_mut().auto_ready = auto_ready;
    }

    /// Total players ever created
    pub fn created_count(&self) -> usize {
        self.state.borrow().players.len()
    }

    /// Players not yet destroyed
    pub fn live_count(&self) -> usize {
        self.state
            .borrow()
            .players
            .iter()
            .filter(|p| !p.borrow().destroyed)
            .count()
    }

    /// Number of players currently playing unmuted
    pub fn audible_count(&self) -> usize {
        self.state
            .borrow()
            .players
            .iter()
            .filter(|p| p.borrow().is_audible())
            .count()
    }

    fn latest(&self, surface: SurfaceId) -> Option<Rc<RefCell<PlayerProbe>>> {
        self.state
            .borrow()
            .players
            .iter()
            .rev()
            .find(|p| p.borrow().surface.id == surface)
            .cloned()
    }

    /// Snapshot of the most recent player bound to `surface`
    pub fn probe(&self, surface: SurfaceId) -> Option<PlayerProbe> {
        self.latest(surface).map(|p| p.borrow().clone())
    }

    /// Snapshots of every player ever created, in creation order
    pub fn probes(&self) -> Vec<PlayerProbe> {
        self.state
            .borrow()
            .players
            .iter()
            .map(|p| p.borrow().clone())
            .collect()
    }

    /// Simulate the surface being removed from the page under a live player
    pub fn detach(&self, surface: SurfaceId) {
        if let Some(p) = self.latest(surface) {
            p.borrow_mut().detached = true;
        }
    }

    /// Player for `surface` completes its ready handshake
    pub fn fire_ready(&self, surface: SurfaceId) {
        if let Some(p) = self.latest(surface) {
            p.borrow_mut().ready = true;
        }
    }

    /// Commands accepted by any player since the last `clear_journal()`
    pub fn journal(&self) -> Vec<(SurfaceId, Command)> {
        self.state.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.borrow_mut().journal.clear();
    }

    /// Advance playback clock of every playing player
    pub fn tick(&self, seconds: f64) {
        for p in &self.state.borrow().players {
            let mut p = p.borrow_mut();
            if !p.paused && !p.destroyed {
                p.position += seconds;
            }
        }
    }
}

impl PlayerSdk for ScriptedSdk {
    fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn create(&mut self, surface: &Surface) -> Result<Box<dyn ReelPlayer>, PlayerError> {
        let mut state = self.state.borrow_mut();
        if !state.ready {
            return Err(PlayerError::NotReady);
        }
        let probe = Rc::new(RefCell::new(PlayerProbe::new(surface.clone(), state.auto_ready)));
        state.players.push(Rc::clone(&probe));
        trace!("ScriptedSdk: created player for {}", surface.id);
        Ok(Box::new(ScriptedPlayer {
            probe,
            sdk: Rc::clone(&self.state),
        }))
    }
}

/// Player half of the scripted SDK
#[derive(Debug)]
pub struct ScriptedPlayer {
    probe: Rc<RefCell<PlayerProbe>>,
    sdk: Rc<RefCell<SdkState>>,
}

impl ScriptedPlayer {
    fn apply(&mut self, cmd: Command) -> Result<(), PlayerError> {
        let mut p = self.probe.borrow_mut();
        if p.detached || p.destroyed {
            return Err(PlayerError::Stale);
        }
        if !p.ready {
            return Err(PlayerError::NotReady);
        }
        match cmd {
            Command::Play => p.paused = false,
            Command::Pause => p.paused = true,
            Command::Mute => p.muted = true,
            Command::Unmute => p.muted = false,
            Command::Seek(t) => p.position = t,
            Command::Destroy => {}
        }
        p.log.push(cmd.clone());
        self.sdk.borrow_mut().journal.push((p.surface.id, cmd));
        Ok(())
    }

    fn query<T>(&self, f: impl FnOnce(&PlayerProbe) -> T) -> Result<T, PlayerError> {
        let p = self.probe.borrow();
        if p.detached || p.destroyed {
            return Err(PlayerError::Stale);
        }
        Ok(f(&p))
    }
}

impl ReelPlayer for ScriptedPlayer {
    fn play(&mut self) -> Result<(), PlayerError> {
        self.apply(Command::Play)
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.apply(Command::Pause)
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.apply(if muted { Command::Mute } else { Command::Unmute })
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<(), PlayerError> {
        self.apply(Command::Seek(seconds))
    }

    fn is_paused(&self) -> Result<bool, PlayerError> {
        self.query(|p| p.paused)
    }

    fn is_muted(&self) -> Result<bool, PlayerError> {
        self.query(|p| p.muted)
    }

    fn is_ready(&self) -> bool {
        self.probe.borrow().ready
    }

    fn destroy(&mut self) {
        let mut p = self.probe.borrow_mut();
        if !p.destroyed {
            p.destroyed = true;
            p.paused = true;
            p.log.push(Command::Destroy);
            self.sdk.borrow_mut().journal.push((p.surface.id, Command::Destroy));
        }
    }
}
