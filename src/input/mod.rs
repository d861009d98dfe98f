//! Navigation input adapters.
//!
//! Each adapter turns raw UI input into a [`NavAction`]; none of them touch
//! the index store or players directly. The session applies the action.

pub mod keyboard;
pub mod press;
pub mod swipe;

pub use keyboard::KeyboardNavigator;
pub use press::{PointerButton, PressControls};
pub use swipe::SwipeAdapter;

/// What an accepted input asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    Next,
    Prev,
    Close,
}

impl std::str::FromStr for NavAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "next" => Ok(NavAction::Next),
            "prev" => Ok(NavAction::Prev),
            "close" => Ok(NavAction::Close),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}
