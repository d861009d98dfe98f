//! Keyboard navigation with cooldown.
//!
//! Default bindings:
//! - `ArrowDown`, `ArrowRight`, `s`, `d` -> next
//! - `ArrowUp`, `ArrowLeft`, `w`, `a`    -> prev
//! - `Escape`                            -> close (ignores cooldown)

use std::collections::HashMap;
use std::time::Instant;

use log::trace;

use super::NavAction;
use crate::core::cooldown::Cooldown;

/// Key -> action mapping plus the cooldown gate for next/prev
#[derive(Debug, Clone)]
pub struct KeyboardNavigator {
    bindings: HashMap<String, NavAction>,
    cooldown: Cooldown,
}

impl Default for KeyboardNavigator {
    fn default() -> Self {
        Self::new(500)
    }
}

impl KeyboardNavigator {
    /// Navigator with default bindings
    pub fn new(cooldown_ms: u64) -> Self {
        let mut nav = Self {
            bindings: HashMap::new(),
            cooldown: Cooldown::new(cooldown_ms),
        };
        nav.setup_default_bindings();
        nav
    }

    pub fn setup_default_bindings(&mut self) {
        use NavAction::*;

        for key in ["ArrowDown", "ArrowRight", "s", "d"] {
            self.add_binding(key, Next);
        }
        for key in ["ArrowUp", "ArrowLeft", "w", "a"] {
            self.add_binding(key, Prev);
        }
        self.add_binding("Escape", Close);
    }

    pub fn add_binding(&mut self, key: impl Into<String>, action: NavAction) {
        self.bindings.insert(key.into(), action);
    }

    pub fn remove_binding(&mut self, key: &str) {
        self.bindings.remove(key);
    }

    pub fn binding(&self, key: &str) -> Option<NavAction> {
        self.bindings.get(key).copied()
    }

    /// Handle a keydown now.
    pub fn handle_key(&mut self, key: &str) -> Option<NavAction> {
        self.handle_key_at(key, Instant::now())
    }

    /// Handle a keydown at `now`. Unbound keys and next/prev inside the
    /// cooldown return `None`.
    pub fn handle_key_at(&mut self, key: &str, now: Instant) -> Option<NavAction> {
        let action = self.binding(key)?;
        match action {
            NavAction::Close => Some(action),
            NavAction::Next | NavAction::Prev => {
                if self.cooldown.try_acquire_at(now) {
                    Some(action)
                } else {
                    trace!("Keyboard: {} dropped (cooldown)", key);
                    None
                }
            }
        }
    }

    pub fn reset_cooldown(&mut self) {
        self.cooldown.reset();
    }
}
