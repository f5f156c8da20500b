use clap::Parser;
use std::path::PathBuf;

/// Asynchronous page renderer for sequential image archives
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory containing the pages to walk
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// Viewport width pages are resized to
    #[arg(short = 'W', long = "width", value_name = "PX", default_value = "1920")]
    pub width: u32,

    /// Viewport height pages are resized for
    #[arg(short = 'H', long = "height", value_name = "PX", default_value = "1080")]
    pub height: u32,

    /// Worker threads (0 = derive from CPU count)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Cache memory budget in MiB
    #[arg(long = "cache-mb", value_name = "MB")]
    pub cache_mb: Option<usize>,

    /// Navigation debounce window in milliseconds
    #[arg(long = "debounce-ms", value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Load pipeline settings from a JSON file (CLI flags override it)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
