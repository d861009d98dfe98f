//! Press / tap gesture (mobile alternative to the keyboard).
//!
//! A press that moves further than the threshold on either axis is a drag and
//! never navigates. A release without a drag is a tap: left half of the
//! surface goes back, right half goes forward. Taps share one cooldown.
//!
//! Mouse input is accepted with the primary button only.

use std::time::Instant;

use log::trace;

use super::NavAction;
use crate::core::cooldown::Cooldown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, Default)]
struct Touch {
    start_x: f32,
    start_y: f32,
    moved: bool,
}

#[derive(Debug, Clone)]
pub struct PressControls {
    cooldown: Cooldown,
    move_threshold: f32,
    /// Surface width for tap zones; 0 = unknown, every tap goes back
    width: f32,
    touch: Option<Touch>,
}

impl Default for PressControls {
    fn default() -> Self {
        Self::new(400, 30.0)
    }
}

impl PressControls {
    pub fn new(cooldown_ms: u64, move_threshold: f32) -> Self {
        Self {
            cooldown: Cooldown::new(cooldown_ms),
            move_threshold,
            width: 0.0,
            touch: None,
        }
    }

    /// Width of the surface receiving taps
    pub fn set_width(&mut self, width: f32) {
        self.width = width.max(0.0);
    }

    pub fn is_touching(&self) -> bool {
        self.touch.is_some()
    }

    pub fn on_touch_start(&mut self, x: f32, y: f32) {
        self.touch = Some(Touch {
            start_x: x,
            start_y: y,
            moved: false,
        });
    }

    pub fn on_touch_move(&mut self, x: f32, y: f32) {
        let threshold = self.move_threshold;
        if let Some(t) = self.touch.as_mut() {
            let dx = (x - t.start_x).abs();
            let dy = (y - t.start_y).abs();
            if dx > threshold || dy > threshold {
                if !t.moved {
                    trace!("Press: drag detected ({:.0}, {:.0})", dx, dy);
                }
                t.moved = true;
            }
        }
    }

    pub fn on_touch_end(&mut self) -> Option<NavAction> {
        self.on_touch_end_at(Instant::now())
    }

    /// Finish the gesture at `now`. Returns the tap action, if any.
    pub fn on_touch_end_at(&mut self, now: Instant) -> Option<NavAction> {
        let touch = self.touch.take()?;
        if touch.moved {
            return None;
        }
        let action = self.zone_action(touch.start_x);
        if self.cooldown.try_acquire_at(now) {
            Some(action)
        } else {
            trace!("Press: tap dropped (cooldown)");
            None
        }
    }

    /// Gesture aborted by the platform (touchcancel, unmount)
    pub fn cancel(&mut self) {
        self.touch = None;
    }

    pub fn on_mouse_down(&mut self, button: PointerButton, x: f32, y: f32) {
        if button == PointerButton::Primary {
            self.on_touch_start(x, y);
        }
    }

    pub fn on_mouse_move(&mut self, x: f32, y: f32) {
        self.on_touch_move(x, y);
    }

    pub fn on_mouse_up(&mut self) -> Option<NavAction> {
        self.on_touch_end()
    }

    fn zone_action(&self, x: f32) -> NavAction {
        if self.width > 0.0 && x >= self.width / 2.0 {
            NavAction::Next
        } else {
            NavAction::Prev
        }
    }

    pub fn reset_cooldown(&mut self) {
        self.cooldown.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn controls() -> PressControls {
        let mut pc = PressControls::new(400, 30.0);
        pc.set_width(400.0);
        pc
    }

    #[test]
    fn test_tap_zones() {
        let mut pc = controls();
        let t0 = Instant::now();
        pc.on_touch_start(50.0, 100.0);
        assert_eq!(pc.on_touch_end_at(t0), Some(NavAction::Prev));

        pc.on_touch_start(350.0, 100.0);
        assert_eq!(
            pc.on_touch_end_at(t0 + Duration::from_millis(450)),
            Some(NavAction::Next)
        );
    }

    #[test]
    fn test_drag_is_not_a_tap() {
        let mut pc = controls();
        pc.on_touch_start(100.0, 100.0);
        pc.on_touch_move(110.0, 105.0);
        pc.on_touch_move(100.0, 160.0);
        // Returning near the origin does not undo the drag
        pc.on_touch_move(101.0, 101.0);
        assert_eq!(pc.on_touch_end(), None);
        assert!(!pc.is_touching());
    }

    #[test]
    fn test_small_jitter_is_still_a_tap() {
        let mut pc = controls();
        pc.on_touch_start(300.0, 100.0);
        pc.on_touch_move(320.0, 120.0);
        assert_eq!(pc.on_touch_end(), Some(NavAction::Next));
    }

    #[test]
    fn test_tap_cooldown() {
        let mut pc = controls();
        let t0 = Instant::now();
        pc.on_touch_start(10.0, 10.0);
        assert!(pc.on_touch_end_at(t0).is_some());
        pc.on_touch_start(10.0, 10.0);
        assert!(pc.on_touch_end_at(t0 + Duration::from_millis(100)).is_none());
    }

    #[test]
    fn test_release_without_press() {
        let mut pc = controls();
        assert_eq!(pc.on_touch_end(), None);
    }

    #[test]
    fn test_secondary_button_ignored() {
        let mut pc = controls();
        pc.on_mouse_down(PointerButton::Secondary, 350.0, 10.0);
        assert!(!pc.is_touching());
        assert_eq!(pc.on_mouse_up(), None);

        pc.on_mouse_down(PointerButton::Primary, 350.0, 10.0);
        assert_eq!(pc.on_mouse_up(), Some(NavAction::Next));
    }

    #[test]
    fn test_unknown_width_goes_back() {
        let mut pc = PressControls::default();
        pc.on_touch_start(999.0, 0.0);
        assert_eq!(pc.on_touch_end(), Some(NavAction::Prev));
    }
}
