mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "reframe")]
#[command(about = "Reframe - Inspect and replay video shard packet dumps", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header of every packet in a dump
    Inspect {
        /// Input dump file (`-` for stdin)
        #[arg(short, long)]
        input: String,

        /// Emit JSON instead of human-readable output
        #[arg(long)]
        json: bool,
    },

    /// Run a dump through the reassembly queue and report recovery
    Replay {
        /// Input dump file (`-` for stdin)
        #[arg(short, long)]
        input: String,

        /// Emit JSON instead of human-readable output
        #[arg(long)]
        json: bool,
    },

    /// Generate a lossy shard stream and measure recovery
    Simulate {
        /// Number of frames to send
        #[arg(long, default_value = "100")]
        frames: usize,

        /// Byte size of each frame
        #[arg(long, default_value = "100000")]
        frame_size: usize,

        /// Shard loss percentage
        #[arg(long, default_value = "0")]
        loss: f64,

        /// Adjacent-shard reorder percentage
        #[arg(long, default_value = "0")]
        reorder: f64,

        /// RNG seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Emit JSON instead of human-readable output
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Inspect { input, json } => commands::inspect::execute(&input, json),

        Commands::Replay { input, json } => commands::replay::execute(&input, json),

        Commands::Simulate {
            frames,
            frame_size,
            loss,
            reorder,
            seed,
            json,
        } => commands::simulate::execute(frames, frame_size, loss, reorder, seed, json),
    }
}
