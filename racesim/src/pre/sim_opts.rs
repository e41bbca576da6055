use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "aegis-race",
    about = "A tick-driven closed-loop race simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Simulate the race in real time with a text leaderboard and operator commands from stdin
    #[clap(short = 'R', long)]
    pub realtime: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of simulation runs (only for headless mode, ignored in real-time mode)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set real-time factor (only relevant in real-time mode)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set simulation timestep size in seconds (duration of one frame)
    #[clap(short, long, default_value = "0.0166667")]
    pub timestep_size: f64,

    /// Stop unfinished runs after this number of frames
    #[clap(short, long)]
    pub max_ticks: Option<u64>,

    /// Write the advisory snapshot of the final race state to this JSON file
    #[clap(long)]
    pub snapshot_out: Option<PathBuf>,

    /// Write the race result to this text file (default: output/last_run.txt)
    #[clap(long)]
    pub result_out: Option<PathBuf>,

    /// Ask the offline strategy advisor this question about the final race state
    #[clap(short, long)]
    pub advise: Option<String>,
}
