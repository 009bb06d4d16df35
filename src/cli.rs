//! Command-line interface for the demo binary.

use clap::Parser;
use std::path::PathBuf;

/// Pinch Canvas - draw in the air with hand landmarks
#[derive(Parser, Debug)]
#[command(name = "pinch-canvas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Landmark helper to spawn; must print one JSON detection per line.
    /// Without it the mouse drives a simulated right hand (hold LMB to pinch).
    #[arg(short, long)]
    pub provider_cmd: Option<String>,

    /// Initial window width
    #[arg(long, default_value_t = 1280)]
    pub width: usize,

    /// Initial window height
    #[arg(long, default_value_t = 720)]
    pub height: usize,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Caption the camera view every few seconds (needs the `camera` feature)
    #[arg(long)]
    pub vision: bool,

    /// Camera used by the vision scanner
    #[arg(long, default_value_t = 0)]
    pub camera_index: u32,

    /// Where exported PNGs go
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["pinch-canvas"]).unwrap();
        assert_eq!((cli.width, cli.height), (1280, 720));
        assert!(cli.provider_cmd.is_none());
        assert!(!cli.vision);
        assert_eq!(cli.export_dir, PathBuf::from("."));
    }

    #[test]
    fn provider_command_is_one_string() {
        let cli = Cli::try_parse_from(["pinch-canvas", "--provider-cmd", "python3 hands.py --fast", "-v"]).unwrap();
        assert_eq!(cli.provider_cmd.as_deref(), Some("python3 hands.py --fast"));
        assert!(cli.verbose);
    }
}
