use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Local render farm: run a frame-range job across parallel renderer processes.
#[derive(Clone, Parser)]
#[command(name = "pseudofarm")]
#[command(about = "Render a project with several renderer instances, or benchmark the best instance count.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Launch the configured number of instances, each rendering the full range with placeholders.
    Render {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Try 1, 2, 3, ... instances on a short range and store the fastest count in the settings file.
    Benchmark {
        #[command(flatten)]
        common: CommonArgs,

        /// Write the collected (instances, frames/s) pairs as JSON (`--results=PATH`). Default path:
        /// `pseudofarm.results.json` next to the project.
        #[arg(long, num_args = 0..=1, require_equals = true, value_name = "PATH")]
        results: Option<Option<PathBuf>>,
    },
    /// Delete truncated image files (top level of DIR only).
    Clean {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Verbose output.
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Report whether each image file is completely written.
    Check {
        #[arg(value_name = "FILE", required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Verbose output.
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

/// Options shared by `render` and `benchmark`. Unset values fall back to `.pseudofarm.toml`
/// next to the project, then to defaults.
#[derive(Clone, Args)]
pub struct CommonArgs {
    /// Project file handed to every instance.
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Number of renderer instances (1-32).
    #[arg(long, short = 'w', value_parser = clap::value_parser!(u32).range(1..=32))]
    pub workers: Option<u32>,

    /// Renderer executable. Default: PSEUDOFARM_EXECUTABLE, settings file, then `blender`.
    #[arg(long)]
    pub exe: Option<PathBuf>,

    /// First frame of the job.
    #[arg(long)]
    pub frame_start: Option<u32>,

    /// Last frame of the job.
    #[arg(long)]
    pub frame_end: Option<u32>,

    /// Render output directory; scanned for partial frames when cancelled.
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Delay between status polls in milliseconds.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Verbose output with a live status bar.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Pass renderer stdout/stderr through instead of discarding it.
    #[arg(long)]
    pub show_worker_output: bool,
}
