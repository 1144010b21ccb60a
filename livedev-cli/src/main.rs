//! livedev: develop Ableton Live MIDI Remote Scripts with live reload.
//!
//! # Usage
//!
//! ```text
//! livedev watch [--livePath <app>] [--liveSet <set.als>] [--name <script>]
//! livedev paths [--livePath <app>] [--name <script>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{paths::PathsArgs, watch::WatchArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "livedev",
    version,
    about = "Sync a MIDI Remote Script into Ableton Live and restart it on every change",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the current directory, sync it into Live and relay Live's log.
    Watch(WatchArgs),

    /// Print the installation, script destination and log file in use.
    Paths(PathsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    livedev_runtime::init_tracing();
    match cli.command {
        Commands::Watch(args) => args.run(),
        Commands::Paths(args) => args.run(),
    }
}
