use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the review server
    Serve(ServeArgs),
    /// Replay a payload's overlay track and write one CSV row per tick
    Replay(ReplayArgs),
    /// Print the shot breakdown of a payload
    Shots(ShotsArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind to
    #[arg(long, default_value_t = 12207)]
    pub port: u16,

    /// Directory searched for analysis payload files
    #[arg(long, env = "SHOT_REVIEW_PAYLOAD_ROOT")]
    pub payload_root: String,

    /// Root directory for stored reviews
    #[arg(long, env = "SHOT_REVIEW_REVIEW_ROOT")]
    pub review_root: String,

    /// Optional directory of dashboard files served at /
    #[arg(long, env = "SHOT_REVIEW_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Analysis payload (JSON) to replay
    pub payload: PathBuf,

    /// Container width in screen units
    #[arg(long, default_value_t = 390.0, value_parser = parse_size)]
    pub width: f64,

    /// Container height in screen units
    #[arg(long, default_value_t = 300.0, value_parser = parse_size)]
    pub height: f64,

    /// Playback start in seconds
    #[arg(long, default_value_t = 0.0)]
    pub start: f64,

    /// Playback end in seconds (defaults to the last tracking sample)
    #[arg(long)]
    pub end: Option<f64>,

    /// Progress notification interval in milliseconds
    #[arg(long, default_value_t = 50)]
    pub tick_ms: u64,

    /// Write CSV here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ShotsArgs {
    /// Analysis payload (JSON)
    pub payload: PathBuf,

    /// Shot to highlight (1-based)
    #[arg(long, default_value_t = 1)]
    pub select: usize,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Container sizes must be finite and non-negative; 0 means "not laid out".
fn parse_size(value: &str) -> Result<f64, String> {
    let size: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if !size.is_finite() || size < 0.0 {
        return Err(format!("{} is not a valid size", value));
    }
    Ok(size)
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
