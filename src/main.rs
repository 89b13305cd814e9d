//! Parsim CLI: start services from flags, read requests from stdin, print `seq:op:result` lines.

use anyhow::Result;
use clap::Parser;
use parsim::engine::arg_parser::Cli;
use parsim::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
