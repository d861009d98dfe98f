//! Mobile / desktop layout detection.
//!
//! The two layouts mount completely different surfaces, so a flip between
//! them invalidates every player handle at once.

use serde::{Deserialize, Serialize};

/// Default breakpoint: widths at or below are mobile
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutMode {
    Mobile,
    #[default]
    Desktop,
}

impl LayoutMode {
    pub fn from_width(width: u32, breakpoint: u32) -> Self {
        if width <= breakpoint {
            LayoutMode::Mobile
        } else {
            LayoutMode::Desktop
        }
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMode::Mobile => write!(f, "mobile"),
            LayoutMode::Desktop => write!(f, "desktop"),
        }
    }
}
