use reelplay::cli::Args;
use reelplay::config::{self, Settings};
use reelplay::core::coordinator::PlaybackState;
use reelplay::core::events::{
    LayoutChangedEvent, SlideChangedEvent, SlideToEvent, WindowGrewEvent,
};
use reelplay::core::scripted::ScriptedSdk;
use reelplay::input::{NavAction, PointerButton};
use reelplay::source::{JsonFileSource, ReelSource};
use reelplay::{EventBus, ReelSession, Surface, downcast_event};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use crossbeam_channel::{Receiver, unbounded};
use log::{debug, error, info, warn};
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

const HELP: &str = "\
commands:
  open N | close | next | prev | goto N
  key NAME          keydown (ArrowDown, ArrowUp, w, s, Escape, ...)
  swipe N           swipe widget reports slide N
  tap X Y W H       press + release at (X, Y) on a W x H area
  mount N | unmount N | ready N
  sdk               player SDK script finished loading
  mute | toggle | resize W
  state | wait MS | help | quit";

/// Driver state around the session
struct Driver {
    session: ReelSession,
    sdk: ScriptedSdk,
    bus: EventBus,
    next_surface: u64,
}

enum Flow {
    Continue,
    Quit,
}

impl Driver {
    fn new(settings: &Settings, manual_ready: bool) -> Self {
        let sdk = ScriptedSdk::not_loaded();
        sdk.set_auto_ready(!manual_ready);
        let bus = EventBus::new();
        let session = ReelSession::new(Box::new(sdk.clone()), settings, bus.emitter());
        Self {
            session,
            sdk,
            bus,
            next_surface: 1,
        }
    }

    fn dispatch(&mut self, line: &str) -> Result<Flow> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = parts.collect();
        debug!("Command: {} {:?}", cmd, args);

        match cmd {
            "next" | "prev" | "close" => match cmd.parse::<NavAction>().map_err(|e| anyhow!(e))? {
                NavAction::Next => report_nav(self.session.next()),
                NavAction::Prev => report_nav(self.session.prev()),
                NavAction::Close => self.session.close(),
            },
            "open" => {
                let n = arg_usize(&args, 0)?;
                if !self.session.open(n) {
                    println!("open {}: out of range", n);
                }
            }
            "goto" => {
                let n = arg_usize(&args, 0)?;
                if !self.session.goto(n) {
                    println!("goto {}: out of range", n);
                }
            }
            "key" => {
                let key = args.first().context("key needs a NAME")?;
                match self.session.on_key(key) {
                    Some(action) => println!("key {}: {:?}", key, action),
                    None => println!("key {}: ignored", key),
                }
            }
            "swipe" => {
                let n = arg_usize(&args, 0)?;
                if !self.session.on_swipe(n) {
                    println!("swipe {}: out of range", n);
                }
            }
            "tap" => {
                let x = arg_f32(&args, 0)?;
                let y = arg_f32(&args, 1)?;
                let w = arg_f32(&args, 2)?;
                // Height only matters to the UI hit area
                let _h = arg_f32(&args, 3)?;
                self.session.set_tap_width(w);
                self.session.on_press_start(PointerButton::Primary, x, y);
                match self.session.on_press_end() {
                    Some(action) => println!("tap: {:?}", action),
                    None => println!("tap: ignored"),
                }
            }
            "mount" => {
                let n = arg_usize(&args, 0)?;
                let src = self
                    .session
                    .items()
                    .get(n)
                    .map(|item| item.video_url.clone())
                    .with_context(|| format!("no reel at {}", n))?;
                let surface = Surface::new(self.next_surface, src);
                self.next_surface += 1;
                let registered = self.session.mount(n, surface.clone());
                println!(
                    "mount {}: {}{}",
                    n,
                    surface.id,
                    if registered { "" } else { " (deferred)" }
                );
            }
            "unmount" => self.session.unmount(arg_usize(&args, 0)?),
            "ready" => {
                let n = arg_usize(&args, 0)?;
                let handle = self
                    .session
                    .coordinator()
                    .registry()
                    .get(n)
                    .map(|h| (h.surface().id, h.generation()));
                let Some((surface, generation)) = handle else {
                    bail!("slide {} has no player", n);
                };
                self.sdk.fire_ready(surface);
                self.session.on_player_ready(n, generation);
            }
            "sdk" => {
                self.sdk.set_ready(true);
                self.session.on_sdk_loaded();
            }
            "mute" => println!("muted: {}", self.session.toggle_mute()),
            "toggle" => match self.session.toggle_play_pause() {
                Some(playing) => println!("playing: {}", playing),
                None => println!("toggle: no active player"),
            },
            "resize" => {
                let w = args
                    .first()
                    .context("resize needs W")?
                    .parse::<u32>()
                    .context("W must be a number")?;
                self.session.on_resize(w);
            }
            "state" => self.print_state(),
            "wait" => {
                let ms = args
                    .first()
                    .context("wait needs MS")?
                    .parse::<u64>()
                    .context("MS must be a number")?;
                thread::sleep(Duration::from_millis(ms));
                self.sdk.tick(ms as f64 / 1000.0);
            }
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Ok(Flow::Quit),
            other => bail!("unknown command: {}", other),
        }

        self.drain_events();
        Ok(Flow::Continue)
    }

    /// Echo events the UI would react to
    fn drain_events(&self) {
        for event in self.bus.poll() {
            if let Some(e) = downcast_event::<SlideChangedEvent>(&event) {
                println!("slide {}/{} ({:?})", e.index + 1, e.total, e.source);
            } else if let Some(SlideToEvent(n)) = downcast_event::<SlideToEvent>(&event) {
                println!("  widget -> slide {}", n);
            } else if let Some(WindowGrewEvent(n)) = downcast_event::<WindowGrewEvent>(&event) {
                println!("  window: {} reels", n);
            } else if let Some(LayoutChangedEvent(mode)) =
                downcast_event::<LayoutChangedEvent>(&event)
            {
                println!("layout: {} (remount surfaces)", mode);
            }
        }
    }

    fn print_state(&mut self) {
        let s = &mut self.session;
        println!(
            "index: {:?}  total: {}  muted: {}  layout: {}  modal: {}  sdk: {:?}",
            s.active_index(),
            s.total(),
            s.is_muted(),
            s.layout(),
            s.is_modal_open(),
            s.sdk_loader().state()
        );
        let indices = s.coordinator().registry().indices();
        for idx in indices {
            let position = s
                .coordinator()
                .registry()
                .get(idx)
                .and_then(|h| self.sdk.probe(h.surface().id))
                .map(|p| p.position)
                .unwrap_or_default();
            match s.playback_state(idx) {
                PlaybackState::Ready {
                    paused,
                    muted,
                    active,
                } => println!(
                    "  [{}] {} {} t={:.1}{}",
                    idx,
                    if paused { "paused " } else { "playing" },
                    if muted { "muted" } else { "sound" },
                    position,
                    if active { "  <- active" } else { "" }
                ),
                PlaybackState::Pending => println!("  [{}] waiting for ready", idx),
                PlaybackState::Uninitialized => println!("  [{}] gone", idx),
            }
        }
        println!("  audible players: {}", self.sdk.audible_count());
    }
}

fn report_nav(index: Option<usize>) {
    if index.is_none() {
        println!("nothing to navigate");
    }
}

fn arg_usize(args: &[&str], i: usize) -> Result<usize> {
    args.get(i)
        .with_context(|| format!("missing argument {}", i + 1))?
        .parse()
        .with_context(|| format!("argument {} must be an index", i + 1))
}

fn arg_f32(args: &[&str], i: usize) -> Result<f32> {
    args.get(i)
        .with_context(|| format!("missing argument {}", i + 1))?
        .parse()
        .with_context(|| format!("argument {} must be a number", i + 1))
}

/// Read command lines on a background thread
fn spawn_reader(script: Option<PathBuf>) -> Result<Receiver<String>> {
    let reader: Box<dyn BufRead + Send> = match script {
        Some(path) => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("Failed to open script: {}", path.display()))?;
            Box::new(std::io::BufReader::new(file))
        }
        None => Box::new(std::io::BufReader::new(std::io::stdin())),
    };
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("reelplay-input".into())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                let line = line.trim().to_string();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn input thread")?;
    Ok(rx)
}

fn load_reels(args: &Args, settings: &Settings, session: &mut ReelSession) -> Result<()> {
    let source: Box<dyn ReelSource> = if let Some(path) = &args.reels {
        Box::new(JsonFileSource::new(path))
    } else {
        http_source(args, settings)?
    };
    info!("Loading reels from {}", source.describe());
    let count = session.load_from(source.as_ref())?;
    println!("loaded {} reels", count);
    Ok(())
}

#[cfg(feature = "http")]
fn http_source(args: &Args, settings: &Settings) -> Result<Box<dyn ReelSource>> {
    use reelplay::source::{HttpReelSource, RetryPolicy};

    let base = args.api.clone().unwrap_or_else(|| settings.api_base_url.clone());
    let retry = RetryPolicy {
        max_retries: settings.fetch_retries,
        base_delay: Duration::from_millis(settings.fetch_retry_delay_ms),
    };
    let mut source = HttpReelSource::new(base, retry)?;
    if let Some(site) = args.site.clone().or_else(|| settings.site.clone()) {
        source = source.with_site(site);
    }
    Ok(Box::new(source))
}

#[cfg(not(feature = "http"))]
fn http_source(_args: &Args, _settings: &Settings) -> Result<Box<dyn ReelSource>> {
    bail!("built without the `http` feature, use --reels FILE")
}

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());

    // Ensure directories exist
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, &path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("reqwest", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!(
            "Logging to file: {} (level: {:?})",
            log_path.display(),
            log_level
        );
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("reqwest", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }

    info!("Reelplay starting...");
    debug!("Command-line args: {:?}", args);

    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    let mut settings = Settings::load(&settings_path).unwrap_or_else(|e| {
        warn!("{:#}, using defaults", e);
        Settings::default()
    });
    if args.muted {
        settings.start_muted = true;
    }

    let mut driver = Driver::new(&settings, args.manual_ready);
    if args.mobile {
        driver.session.on_resize(settings.mobile_breakpoint_px);
    }

    if let Err(e) = load_reels(&args, &settings, &mut driver.session) {
        error!("{:#}", e);
        println!("no reels loaded: {:#}", e);
    }
    driver.drain_events();

    let rx = spawn_reader(args.script.clone())?;
    for line in rx.iter() {
        match driver.dispatch(&line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("error: {:#}", e),
        }
    }

    // Leave nothing playing
    driver.session.close();
    info!("Reelplay exiting");
    Ok(())
}
