//! End-to-end scenarios against the scripted player SDK.

use std::thread;
use std::time::Duration;

use reelplay::config::Settings;
use reelplay::core::coordinator::PlaybackState;
use reelplay::core::registry::PlayerRegistry;
use reelplay::core::scripted::Command;
use reelplay::source::{JsonFileSource, ReelItem};
use reelplay::{
    EventBus, LayoutMode, NavAction, PlaybackCoordinator, ReelSession, ScriptedSdk, Surface,
    SurfaceId,
};

fn reel(i: usize) -> ReelItem {
    ReelItem {
        id: format!("reel-{}", i),
        video_url: format!("https://vz.example/{}/playlist.m3u8", i),
        thumbnail_url: format!("https://vz.example/{}/thumb.jpg", i),
        preview_animation_url: None,
        product: None,
        is_deleted: false,
    }
}

fn session_with(n: usize, settings: &Settings) -> (ReelSession, ScriptedSdk) {
    let sdk = ScriptedSdk::new();
    let mut session = ReelSession::new(Box::new(sdk.clone()), settings, EventBus::new().emitter());
    session.load_items((0..n).map(reel).collect());
    (session, sdk)
}

fn mount_all(session: &mut ReelSession) {
    for i in 0..session.total() {
        session.mount(i, Surface::new(i as u64, format!("slide-{}", i)));
    }
}

fn assert_only_playing(sdk: &ScriptedSdk, active: u64, total: u64) {
    for i in 0..total {
        let p = sdk.probe(SurfaceId(i)).expect("player exists");
        if i == active {
            assert!(!p.paused, "slide {} should play", i);
        } else {
            assert!(p.paused && p.muted, "slide {} should be paused and muted", i);
        }
    }
}

#[test]
fn next_prev_resets_each_activation() {
    let (mut s, sdk) = session_with(3, &Settings::default());
    s.open(0);
    mount_all(&mut s);
    assert_only_playing(&sdk, 0, 3);

    sdk.tick(4.0);
    assert_eq!(s.next(), Some(1));
    assert_only_playing(&sdk, 1, 3);
    assert_eq!(sdk.probe(SurfaceId(1)).unwrap().position, 0.0);

    sdk.tick(3.0);
    assert_eq!(s.prev(), Some(0));
    assert_only_playing(&sdk, 0, 3);
    // A -> B -> A: A starts over
    assert_eq!(sdk.probe(SurfaceId(0)).unwrap().position, 0.0);
    assert_eq!(sdk.audible_count(), 1);
}

#[test]
fn wraparound_both_directions() {
    let (mut s, _sdk) = session_with(3, &Settings::default());
    s.open(2);
    assert_eq!(s.next(), Some(0));
    assert_eq!(s.prev(), Some(2));
}

#[test]
fn mute_twice_does_not_restart() {
    let (mut s, sdk) = session_with(3, &Settings::default());
    s.open(1);
    mount_all(&mut s);
    sdk.tick(2.0);

    assert!(s.toggle_mute());
    assert!(sdk.probe(SurfaceId(1)).unwrap().muted);
    assert!(!s.toggle_mute());

    let p = sdk.probe(SurfaceId(1)).unwrap();
    assert_eq!(p.position, 2.0);
    assert!(!p.paused);
    assert!(!p.muted);
    // Only the initial activation seeked
    let seeks = p.log.iter().filter(|c| matches!(c, Command::Seek(_))).count();
    assert_eq!(seeks, 1);
}

#[test]
fn rapid_keys_accept_one_navigation() {
    let (mut s, _sdk) = session_with(5, &Settings::default());
    s.open(0);
    let accepted = (0..3)
        .filter_map(|_| s.on_key("ArrowDown"))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(s.active_index(), Some(1));
}

#[test]
fn keys_accepted_after_cooldown() {
    let settings = Settings {
        keyboard_cooldown_ms: 30,
        ..Settings::default()
    };
    let (mut s, _sdk) = session_with(5, &settings);
    s.open(0);
    assert_eq!(s.on_key("s"), Some(NavAction::Next));
    thread::sleep(Duration::from_millis(60));
    assert_eq!(s.on_key("w"), Some(NavAction::Prev));
    assert_eq!(s.active_index(), Some(0));
}

#[test]
fn close_tears_everything_down_and_is_idempotent() {
    let (mut s, sdk) = session_with(4, &Settings::default());
    s.open(2);
    mount_all(&mut s);
    s.close();
    assert_eq!(sdk.live_count(), 0);
    assert_eq!(sdk.audible_count(), 0);
    assert!(s.coordinator().registry().is_empty());
    s.close();
    assert_eq!(sdk.live_count(), 0);
}

#[test]
fn double_register_keeps_one_live_handle() {
    let sdk = ScriptedSdk::new();
    let registry = PlayerRegistry::new(Box::new(sdk.clone()));
    let mut coordinator = PlaybackCoordinator::new(registry, false);
    coordinator.sync_to_index(0);
    assert!(coordinator.on_mount(0, Surface::new(1, "a")));
    assert!(coordinator.on_mount(0, Surface::new(2, "a-remounted")));
    assert_eq!(coordinator.registry().len(), 1);
    assert_eq!(sdk.live_count(), 1);
    assert!(!sdk.probe(SurfaceId(2)).unwrap().paused);
    assert!(sdk.probe(SurfaceId(1)).unwrap().destroyed);
}

#[test]
fn stale_handle_is_dropped_and_remount_recovers() {
    let (mut s, sdk) = session_with(3, &Settings::default());
    s.open(0);
    mount_all(&mut s);
    sdk.detach(SurfaceId(1));

    s.next();
    assert_eq!(s.playback_state(1), PlaybackState::Uninitialized);
    assert_eq!(sdk.audible_count(), 0);

    s.mount(1, Surface::new(11, "slide-1-again"));
    assert!(!sdk.probe(SurfaceId(11)).unwrap().paused);
    assert_eq!(sdk.audible_count(), 1);
}

#[test]
fn late_ready_callback_starts_active_slide() {
    let (mut s, sdk) = session_with(3, &Settings::default());
    sdk.set_auto_ready(false);
    s.open(1);
    mount_all(&mut s);
    assert_eq!(s.playback_state(1), PlaybackState::Pending);

    let gen_1 = s.coordinator().registry().get(1).unwrap().generation();
    sdk.fire_ready(SurfaceId(1));
    assert!(s.on_player_ready(1, gen_1));
    assert_eq!(
        s.playback_state(1),
        PlaybackState::Ready {
            paused: false,
            muted: false,
            active: true
        }
    );

    // Callback from a replaced player is ignored
    let gen_0 = s.coordinator().registry().get(0).unwrap().generation();
    s.mount(0, Surface::new(20, "slide-0-again"));
    assert!(!s.on_player_ready(0, gen_0));
}

#[test]
fn layout_flip_and_swipe_authority() {
    let (mut s, sdk) = session_with(4, &Settings::default());
    s.on_resize(1024);
    s.open(0);
    mount_all(&mut s);

    assert!(s.on_resize(390));
    assert_eq!(s.layout(), LayoutMode::Mobile);
    assert_eq!(sdk.live_count(), 0);

    for i in 0..4 {
        s.mount(i, Surface::new(100 + i as u64, format!("m{}", i)));
    }
    assert!(s.on_swipe(2));
    assert_eq!(s.active_index(), Some(2));
    assert!(!sdk.probe(SurfaceId(102)).unwrap().paused);
    assert!(sdk.probe(SurfaceId(100)).unwrap().paused);
    assert_eq!(sdk.audible_count(), 1);
}

#[test]
fn loads_reels_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reels.json");
    std::fs::write(
        &path,
        r#"{"reels": [
            {"_id": "a", "videoUrl": "https://v/a.m3u8", "thumbnailUrl": "https://v/a.jpg"},
            {"_id": "b", "videoUrl": "https://v/b.m3u8", "thumbnailUrl": "https://v/b.jpg",
             "isDeleted": true},
            {"_id": "c", "videoUrl": "https://v/c.m3u8", "thumbnailUrl": "https://v/c.jpg"}
        ]}"#,
    )
    .unwrap();

    let sdk = ScriptedSdk::new();
    let mut s = ReelSession::new(Box::new(sdk), &Settings::default(), EventBus::new().emitter());
    assert_eq!(s.load_from(&JsonFileSource::new(&path)).unwrap(), 2);
    assert_eq!(s.items()[1].id, "c");
}
