use clap::Parser;
use std::path::PathBuf;

#[cfg(feature = "http")]
const FETCH_BACKEND: &str = "reqwest 0.12 (blocking)";
#[cfg(not(feature = "http"))]
const FETCH_BACKEND: &str = "disabled (file sources only)";

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "HTTP:   ", FETCH_BACKEND, "\n",
    "Player: scripted SDK\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Reel player coordinator driver
///
/// Reads commands (one per line) from `--script` or stdin and drives a reel
/// session against the scripted player SDK. Type `help` for the command list.
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Load reels from a JSON file (`{"data": [...]}`, `{"reels": [...]}` or a bare array)
    #[arg(short = 'r', long = "reels", value_name = "FILE", conflicts_with = "api")]
    pub reels: Option<PathBuf>,

    /// Fetch reels from the widget API at this base URL
    #[arg(short = 'u', long = "api", value_name = "URL")]
    pub api: Option<String>,

    /// Storefront passed to the API as `?site=`
    #[arg(long = "site", value_name = "HOST")]
    pub site: Option<String>,

    /// Read commands from a file instead of stdin
    #[arg(short = 's', long = "script", value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Start muted
    #[arg(short = 'm', long = "muted")]
    pub muted: bool,

    /// Start in mobile layout
    #[arg(long = "mobile")]
    pub mobile: bool,

    /// Players wait for an explicit `ready N` before accepting commands
    #[arg(long = "manual-ready")]
    pub manual_ready: bool,

    /// Enable debug logging to file (default: reelplay.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}
