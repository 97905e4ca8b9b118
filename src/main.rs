//! pseudofarm CLI: render a project with parallel renderer instances, or benchmark the instance count.

use anyhow::Result;
use clap::Parser;
use pseudofarm::engine::arg_parser::Cli;
use pseudofarm::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
