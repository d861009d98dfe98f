//! Reel session - wires input, index store, window and coordinator together.
//!
//! **Architecture**: the session owns every piece of mutable state for one
//! widget instance (item list, index store, coordinator, input adapters) and
//! is driven from a single event loop. Every method runs to completion
//! without yielding, so no two mount/unmount/sync sequences ever interleave.
//!
//! ```text
//! key / tap / click / swipe
//!         |
//!   input adapters (cooldown) --> NavAction
//!         |
//!     IndexStore  (swipe: widget index is written in, never read back)
//!         |
//!   PlaybackCoordinator::sync_to_index --> PlayerRegistry --> ReelPlayer
//!         |
//!     EventEmitter (SlideChanged, SlideTo, MuteChanged, ...)
//! ```
//!
//! Mount/unmount of slide surfaces comes from the UI. Surfaces that mount
//! before the SDK script arrives are remembered and registered on
//! `on_sdk_loaded()`.

use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::config::Settings;
use crate::core::coordinator::{PlaybackCoordinator, PlaybackState};
use crate::core::event_bus::EventEmitter;
use crate::core::events::{
    InputSource, ItemsLoadedEvent, LayoutChangedEvent, ModalClosedEvent, ModalOpenedEvent,
    MuteChangedEvent, PlaybackToggledEvent, SlideChangedEvent, SlideToEvent, WindowGrewEvent,
};
use crate::core::index_store::IndexStore;
use crate::core::registry::PlayerRegistry;
use crate::core::sdk::{LoadRequest, PlayerSdk, SdkLoader, Surface};
use crate::input::swipe::SwipeDirection;
use crate::input::{KeyboardNavigator, NavAction, PointerButton, PressControls, SwipeAdapter};
use crate::layout::LayoutMode;
use crate::source::{ReelItem, ReelSource, ReelWindow};

pub struct ReelSession {
    items: Vec<ReelItem>,
    store: IndexStore,
    coordinator: PlaybackCoordinator,
    keyboard: KeyboardNavigator,
    press: PressControls,
    swipe: SwipeAdapter,
    window: ReelWindow,
    layout: LayoutMode,
    breakpoint: u32,
    /// Surfaces currently on the page, registered or not
    mounted: IndexMap<usize, Surface>,
    sdk_loader: SdkLoader,
    modal_open: bool,
    events: EventEmitter,
}

impl ReelSession {
    pub fn new(sdk: Box<dyn PlayerSdk>, settings: &Settings, events: EventEmitter) -> Self {
        let coordinator = PlaybackCoordinator::new(PlayerRegistry::new(sdk), settings.start_muted);
        info!(
            "ReelSession created (muted: {}, breakpoint: {}px)",
            settings.start_muted, settings.mobile_breakpoint_px
        );
        Self {
            items: Vec::new(),
            store: IndexStore::new(),
            coordinator,
            keyboard: KeyboardNavigator::new(settings.keyboard_cooldown_ms),
            press: PressControls::new(settings.press_cooldown_ms, settings.press_move_threshold_px),
            swipe: SwipeAdapter::new(),
            window: ReelWindow::new(settings.initial_window),
            layout: LayoutMode::default(),
            breakpoint: settings.mobile_breakpoint_px,
            mounted: IndexMap::new(),
            sdk_loader: SdkLoader::new(settings.player_script_url.clone()),
            modal_open: false,
            events,
        }
    }

    // === Items ===

    /// Replace the item list. Players of the old list are torn down.
    pub fn load_items(&mut self, items: Vec<ReelItem>) {
        self.coordinator.clear();
        self.coordinator.deactivate();
        self.mounted.clear();
        self.swipe.detach();
        self.items = items;
        self.store.reset(self.items.len());
        self.window.reset(self.items.len());
        info!("Loaded {} reels", self.items.len());
        self.events.emit(ItemsLoadedEvent(self.items.len()));

        // Modal stays on the new first slide; nothing left to show closes it
        if self.modal_open {
            match self.store.current() {
                Some(index) => self.coordinator.sync_to_index(index),
                None => self.close(),
            }
        }
    }

    /// Fetch from `source`. On failure the session is left with no items
    /// (navigation becomes a no-op) and the error is returned.
    pub fn load_from(&mut self, source: &dyn ReelSource) -> Result<usize> {
        match source.fetch() {
            Ok(items) => {
                self.load_items(items);
                Ok(self.items.len())
            }
            Err(e) => {
                warn!("Reel fetch from {} failed: {:#}", source.describe(), e);
                self.load_items(Vec::new());
                Err(e)
            }
        }
    }

    pub fn items(&self) -> &[ReelItem] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Items inside the mounted window
    pub fn visible_items(&self) -> &[ReelItem] {
        self.window.visible(&self.items)
    }

    pub fn current_item(&self) -> Option<&ReelItem> {
        self.store.current().and_then(|i| self.items.get(i))
    }

    // === State ===

    pub fn active_index(&self) -> Option<usize> {
        self.store.current()
    }

    pub fn is_muted(&self) -> bool {
        self.coordinator.is_muted()
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn coordinator(&self) -> &PlaybackCoordinator {
        &self.coordinator
    }

    pub fn playback_state(&mut self, index: usize) -> PlaybackState {
        self.coordinator.playback_state(index)
    }

    // === Modal ===

    /// Open the fullscreen player on `index`.
    pub fn open(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            warn!("Cannot open slide {} of {}", index, self.items.len());
            return false;
        }
        self.modal_open = true;
        self.keyboard.reset_cooldown();
        self.press.reset_cooldown();
        self.events.emit(ModalOpenedEvent(index));
        self.apply_index(index, InputSource::Direct);
        true
    }

    /// Close the player: every handle is torn down, nothing keeps playing.
    pub fn close(&mut self) {
        if !self.modal_open {
            return;
        }
        self.modal_open = false;
        self.coordinator.pause_all();
        self.coordinator.clear();
        self.coordinator.deactivate();
        self.store.clear();
        self.mounted.clear();
        self.swipe.detach();
        self.press.cancel();
        info!("Modal closed");
        self.events.emit(ModalClosedEvent);
    }

    // === Navigation ===

    pub fn next(&mut self) -> Option<usize> {
        self.navigate(NavAction::Next, InputSource::Direct)
    }

    pub fn prev(&mut self) -> Option<usize> {
        self.navigate(NavAction::Prev, InputSource::Direct)
    }

    /// Absolute jump (thumbnail / dot click)
    pub fn goto(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            warn!("Slide {} out of range (total {})", index, self.items.len());
            return false;
        }
        self.apply_index(index, InputSource::Direct);
        true
    }

    fn navigate(&mut self, action: NavAction, source: InputSource) -> Option<usize> {
        let total = self.items.len();
        let index = match action {
            NavAction::Next => self.store.next(total)?,
            NavAction::Prev => self.store.prev(total)?,
            NavAction::Close => {
                self.close();
                return None;
            }
        };
        // Keyboard "next" exposes one more reel ahead of the viewer
        let append = action == NavAction::Next && source == InputSource::Keyboard;
        self.after_index_change(index, source, append);
        Some(index)
    }

    fn apply_index(&mut self, index: usize, source: InputSource) {
        self.store.set(index);
        self.after_index_change(index, source, false);
    }

    fn after_index_change(&mut self, index: usize, source: InputSource, append: bool) {
        self.coordinator.sync_to_index(index);
        let appended = append && self.window.append_next();
        let grew = self.window.on_index(index);
        if appended || grew {
            self.events.emit(WindowGrewEvent(self.window.loaded()));
        }
        if source != InputSource::Swipe
            && let Some(target) = self.swipe.follow_store(index)
        {
            self.events.emit(SlideToEvent(target));
        }
        debug!("Slide {} / {} via {:?}", index, self.items.len(), source);
        self.events.emit(SlideChangedEvent {
            index,
            total: self.items.len(),
            source,
        });
    }

    /// Keydown while the modal is open. Returns the accepted action.
    pub fn on_key(&mut self, key: &str) -> Option<NavAction> {
        if !self.modal_open {
            return None;
        }
        let action = self.keyboard.handle_key(key)?;
        self.navigate(action, InputSource::Keyboard);
        Some(action)
    }

    pub fn on_press_start(&mut self, button: PointerButton, x: f32, y: f32) {
        self.press.on_mouse_down(button, x, y);
    }

    pub fn on_press_move(&mut self, x: f32, y: f32) {
        self.press.on_touch_move(x, y);
    }

    /// Release of a press gesture. A tap navigates by zone.
    pub fn on_press_end(&mut self) -> Option<NavAction> {
        let action = self.press.on_touch_end()?;
        if !self.modal_open {
            return None;
        }
        self.navigate(action, InputSource::Press);
        Some(action)
    }

    pub fn set_tap_width(&mut self, width: f32) {
        self.press.set_width(width);
    }

    /// Swipe widget slide-change. The widget's index is authoritative.
    pub fn on_swipe(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            warn!("Swipe to {} ignored (total {})", index, self.items.len());
            return false;
        }
        let direction = self.swipe.on_slide_change(index);
        if self.store.current() == Some(index) {
            // Echo of our own slideTo, or a no-op swipe: keep players in sync
            self.coordinator.sync_to_index(index);
            return true;
        }
        debug!("Swipe {:?} to slide {}", direction, index);
        self.store.set(index);
        self.after_index_change(index, InputSource::Swipe, direction == SwipeDirection::Forward);
        true
    }

    // === Surfaces ===

    /// Slide `index` mounted its video surface.
    pub fn mount(&mut self, index: usize, surface: Surface) -> bool {
        if index >= self.items.len() {
            warn!("Mount of slide {} ignored (total {})", index, self.items.len());
            return false;
        }
        self.mounted.insert(index, surface.clone());
        match self.sdk_loader.ensure_loaded() {
            LoadRequest::Start => debug!("Player SDK requested: {}", self.sdk_loader.script_url()),
            LoadRequest::Pending => {}
            LoadRequest::Ready => {}
        }
        self.coordinator.on_mount(index, surface)
    }

    /// Slide `index` unmounted its surface.
    pub fn unmount(&mut self, index: usize) {
        self.mounted.shift_remove(&index);
        self.coordinator.on_unmount(index);
    }

    /// Player SDK script finished loading: register everything that mounted
    /// while waiting.
    pub fn on_sdk_loaded(&mut self) {
        if !self.sdk_loader.on_loaded() {
            return;
        }
        let pending: Vec<(usize, Surface)> = self
            .mounted
            .iter()
            .filter(|(idx, _)| self.coordinator.registry().get(**idx).is_none())
            .map(|(idx, s)| (*idx, s.clone()))
            .collect();
        debug!("SDK loaded, registering {} deferred surfaces", pending.len());
        for (idx, surface) in pending {
            self.coordinator.on_mount(idx, surface);
        }
    }

    pub fn on_sdk_failed(&mut self, reason: &str) {
        self.sdk_loader.on_failed(reason);
    }

    pub fn sdk_loader(&self) -> &SdkLoader {
        &self.sdk_loader
    }

    /// Ready callback from the player bound to slide `index`
    pub fn on_player_ready(&mut self, index: usize, generation: u64) -> bool {
        self.coordinator.on_player_ready(index, generation)
    }

    /// Viewport resized. A mobile/desktop flip invalidates every handle;
    /// the UI remounts the new layout's surfaces afterwards.
    pub fn on_resize(&mut self, width: u32) -> bool {
        let mode = LayoutMode::from_width(width, self.breakpoint);
        if mode == self.layout {
            return false;
        }
        info!("Layout {} -> {}", self.layout, mode);
        self.layout = mode;
        self.coordinator.clear();
        self.mounted.clear();
        self.swipe.detach();
        self.press.cancel();
        self.events.emit(LayoutChangedEvent(mode));
        true
    }

    // === Playback ===

    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.coordinator.toggle_mute();
        self.events.emit(MuteChangedEvent(muted));
        muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.coordinator.is_muted() != muted {
            self.coordinator.set_muted(muted);
            self.events.emit(MuteChangedEvent(muted));
        }
    }

    /// Overlay tap on the active slide
    pub fn toggle_play_pause(&mut self) -> Option<bool> {
        let playing = self.coordinator.toggle_play_pause()?;
        if let Some(index) = self.store.current() {
            self.events.emit(PlaybackToggledEvent { index, playing });
        }
        Some(playing)
    }
}

impl std::fmt::Debug for ReelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReelSession")
            .field("items", &self.items.len())
            .field("index", &self.store.current())
            .field("layout", &self.layout)
            .field("modal_open", &self.modal_open)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::{EventBus, downcast_event};
    use crate::core::scripted::ScriptedSdk;
    use crate::core::sdk::SurfaceId;

    fn items(n: usize) -> Vec<ReelItem> {
        (0..n)
            .map(|i| ReelItem {
                id: format!("r{}", i),
                video_url: format!("https://cdn/v{}.m3u8", i),
                thumbnail_url: format!("https://cdn/t{}.jpg", i),
                preview_animation_url: None,
                product: None,
                is_deleted: false,
            })
            .collect()
    }

    fn session(n: usize) -> (ReelSession, ScriptedSdk, EventBus) {
        let sdk = ScriptedSdk::new();
        let bus = EventBus::new();
        let mut s = ReelSession::new(Box::new(sdk.clone()), &Settings::default(), bus.emitter());
        s.load_items(items(n));
        (s, sdk, bus)
    }

    fn mount_all(s: &mut ReelSession) {
        for i in 0..s.total() {
            s.mount(i, Surface::new(i as u64, format!("v{}", i)));
        }
    }

    #[test]
    fn test_navigation_noop_without_items() {
        let (mut s, sdk, _bus) = session(0);
        assert_eq!(s.next(), None);
        assert_eq!(s.prev(), None);
        assert!(!s.open(0));
        assert_eq!(s.active_index(), None);
        assert_eq!(sdk.created_count(), 0);
    }

    #[test]
    fn test_keyboard_requires_open_modal() {
        let (mut s, _sdk, _bus) = session(3);
        assert_eq!(s.on_key("ArrowDown"), None);
        s.open(0);
        assert_eq!(s.on_key("ArrowDown"), Some(NavAction::Next));
        assert_eq!(s.active_index(), Some(1));
    }

    #[test]
    fn test_escape_closes_and_silences() {
        let (mut s, sdk, bus) = session(3);
        s.open(0);
        mount_all(&mut s);
        assert_eq!(sdk.audible_count(), 1);

        assert_eq!(s.on_key("Escape"), Some(NavAction::Close));
        assert!(!s.is_modal_open());
        assert_eq!(s.active_index(), None);
        assert_eq!(sdk.live_count(), 0);
        assert_eq!(sdk.audible_count(), 0);
        assert!(
            bus.poll()
                .iter()
                .any(|e| downcast_event::<ModalClosedEvent>(e).is_some())
        );
    }

    #[test]
    fn test_keyboard_sync_asks_widget_to_follow() {
        let (mut s, _sdk, bus) = session(4);
        s.open(0);
        bus.poll();
        s.on_key("d");
        let events = bus.poll();
        let slide_to: Vec<_> = events
            .iter()
            .filter_map(|e| downcast_event::<SlideToEvent>(e))
            .collect();
        assert_eq!(slide_to, vec![&SlideToEvent(1)]);
    }

    #[test]
    fn test_swipe_is_authoritative() {
        let (mut s, sdk, bus) = session(5);
        s.open(0);
        mount_all(&mut s);
        bus.poll();

        assert!(s.on_swipe(3));
        assert_eq!(s.active_index(), Some(3));
        assert!(!sdk.probe(SurfaceId(3)).unwrap().paused);
        let events = bus.poll();
        // The widget already is at 3: no slideTo back at it
        assert!(events.iter().all(|e| downcast_event::<SlideToEvent>(e).is_none()));
        let changed = events
            .iter()
            .find_map(|e| downcast_event::<SlideChangedEvent>(e))
            .unwrap();
        assert_eq!(changed.source, InputSource::Swipe);
    }

    #[test]
    fn test_swipe_echo_does_not_restart() {
        let (mut s, sdk, _bus) = session(3);
        s.open(0);
        mount_all(&mut s);
        s.next();
        sdk.tick(2.5);
        // Widget reports the slideTo we asked for
        s.on_swipe(1);
        assert_eq!(sdk.probe(SurfaceId(1)).unwrap().position, 2.5);
    }

    #[test]
    fn test_swipe_out_of_range() {
        let (mut s, _sdk, _bus) = session(2);
        s.open(0);
        assert!(!s.on_swipe(7));
        assert_eq!(s.active_index(), Some(0));
    }

    #[test]
    fn test_sdk_late_load_registers_deferred_surfaces() {
        let sdk = ScriptedSdk::not_loaded();
        let mut s = ReelSession::new(
            Box::new(sdk.clone()),
            &Settings::default(),
            EventEmitter::default(),
        );
        s.load_items(items(3));
        s.open(1);
        mount_all(&mut s);
        assert_eq!(sdk.created_count(), 0);
        assert_eq!(s.sdk_loader().state(), &crate::core::sdk::LoadState::Loading);

        sdk.set_ready(true);
        s.on_sdk_loaded();
        assert_eq!(sdk.live_count(), 3);
        assert!(!sdk.probe(SurfaceId(1)).unwrap().paused);
        assert_eq!(sdk.audible_count(), 1);

        // Duplicate signal does not create more players
        s.on_sdk_loaded();
        assert_eq!(sdk.created_count(), 3);
    }

    #[test]
    fn test_layout_flip_invalidates_handles() {
        let (mut s, sdk, _bus) = session(3);
        s.on_resize(1280);
        s.open(2);
        mount_all(&mut s);
        assert_eq!(sdk.live_count(), 3);

        assert!(s.on_resize(375));
        assert_eq!(s.layout(), LayoutMode::Mobile);
        assert!(s.coordinator().registry().is_empty());
        assert_eq!(sdk.live_count(), 0);
        assert_eq!(s.active_index(), Some(2));

        // Mobile surfaces mount; active slide plays from the start
        s.mount(2, Surface::new(102, "m2"));
        let p = sdk.probe(SurfaceId(102)).unwrap();
        assert!(!p.paused);
        assert_eq!(p.position, 0.0);

        // Same layout: nothing happens
        assert!(!s.on_resize(400));
        assert_eq!(sdk.live_count(), 1);
    }

    #[test]
    fn test_window_grows_with_navigation() {
        let (mut s, _sdk, _bus) = session(8);
        assert_eq!(s.visible_items().len(), 3);
        s.open(0);
        for _ in 0..4 {
            s.next();
        }
        assert_eq!(s.active_index(), Some(4));
        assert_eq!(s.visible_items().len(), 6);
        s.prev();
        assert_eq!(s.visible_items().len(), 6);
    }

    #[test]
    fn test_toggle_play_pause_emits() {
        let (mut s, sdk, bus) = session(2);
        s.open(1);
        mount_all(&mut s);
        bus.poll();
        assert_eq!(s.toggle_play_pause(), Some(false));
        assert!(sdk.probe(SurfaceId(1)).unwrap().paused);
        let events = bus.poll();
        assert_eq!(
            downcast_event::<PlaybackToggledEvent>(&events[0]),
            Some(&PlaybackToggledEvent {
                index: 1,
                playing: false
            })
        );
    }

    #[test]
    fn test_press_tap_navigates() {
        let (mut s, _sdk, _bus) = session(3);
        s.set_tap_width(300.0);
        s.open(0);
        s.on_press_start(PointerButton::Primary, 250.0, 40.0);
        assert_eq!(s.on_press_end(), Some(NavAction::Next));
        assert_eq!(s.active_index(), Some(1));

        // Drag never navigates
        s.on_press_start(PointerButton::Primary, 10.0, 40.0);
        s.on_press_move(10.0, 200.0);
        assert_eq!(s.on_press_end(), None);
        assert_eq!(s.active_index(), Some(1));
    }

    #[test]
    fn test_reload_while_open_activates_first_slide() {
        let (mut s, sdk, _bus) = session(3);
        s.open(2);
        mount_all(&mut s);

        s.load_items(items(4));
        assert!(s.is_modal_open());
        assert_eq!(s.active_index(), Some(0));
        assert_eq!(s.coordinator().active(), Some(0));
        assert_eq!(sdk.live_count(), 0);

        // First slide of the new list plays as soon as it mounts
        s.mount(0, Surface::new(50, "new-0"));
        s.mount(1, Surface::new(51, "new-1"));
        assert!(!sdk.probe(SurfaceId(50)).unwrap().paused);
        assert!(sdk.probe(SurfaceId(51)).unwrap().paused);
        assert_eq!(sdk.audible_count(), 1);
    }

    #[test]
    fn test_reload_empty_while_open_closes() {
        let (mut s, sdk, bus) = session(3);
        s.open(1);
        mount_all(&mut s);
        bus.poll();

        s.load_items(Vec::new());
        assert!(!s.is_modal_open());
        assert_eq!(s.active_index(), None);
        assert_eq!(sdk.live_count(), 0);
        assert!(
            bus.poll()
                .iter()
                .any(|e| downcast_event::<ModalClosedEvent>(e).is_some())
        );
    }

    #[test]
    fn test_mount_out_of_range_rejected() {
        let (mut s, sdk, _bus) = session(2);
        s.open(0);
        assert!(!s.mount(2, Surface::new(9, "nope")));
        assert!(!s.mount(40, Surface::new(10, "nope")));
        assert_eq!(sdk.created_count(), 0);
        assert!(s.coordinator().registry().is_empty());
        // Rejected mounts do not count as a pending surface either
        s.on_sdk_loaded();
        assert_eq!(sdk.created_count(), 0);
    }

    #[test]
    fn test_keyboard_next_appends_to_window() {
        let (mut s, _sdk, bus) = session(8);
        s.open(0);
        bus.poll();
        assert_eq!(s.visible_items().len(), 3);

        s.on_key("ArrowDown");
        assert_eq!(s.active_index(), Some(1));
        assert_eq!(s.visible_items().len(), 4);
        let grew: Vec<_> = bus
            .poll()
            .iter()
            .filter_map(|e| downcast_event::<WindowGrewEvent>(e).cloned())
            .collect();
        assert_eq!(grew, vec![WindowGrewEvent(4)]);

        // Prev and direct jumps do not append
        s.keyboard.reset_cooldown();
        s.on_key("ArrowUp");
        s.next();
        assert_eq!(s.visible_items().len(), 4);
    }

    #[test]
    fn test_forward_swipe_appends_backward_does_not() {
        let (mut s, _sdk, _bus) = session(8);
        s.open(0);
        s.on_swipe(1);
        assert_eq!(s.visible_items().len(), 4);
        s.on_swipe(0);
        assert_eq!(s.visible_items().len(), 4);
        s.on_swipe(1);
        assert_eq!(s.visible_items().len(), 5);
    }

    #[test]
    fn test_load_failure_leaves_empty_session() {
        struct Broken;
        impl ReelSource for Broken {
            fn fetch(&self) -> Result<Vec<ReelItem>> {
                Err(anyhow::anyhow!("503"))
            }
            fn describe(&self) -> String {
                "broken".into()
            }
        }

        let (mut s, _sdk, _bus) = session(3);
        assert!(s.load_from(&Broken).is_err());
        assert_eq!(s.total(), 0);
        assert_eq!(s.next(), None);
    }
}
