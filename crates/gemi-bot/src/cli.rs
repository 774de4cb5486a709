use std::path::PathBuf;

use clap::Parser;

/// Gemi, a Telegram chat bot backed by Gemini.
#[derive(Parser, Debug)]
#[command(name = "gemi", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. `gemi=debug`), used when RUST_LOG is unset.
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
