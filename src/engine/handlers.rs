//! CLI command handler: load config, start the pipeline, serve stdin, drain on end of input.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io;
use std::path::PathBuf;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::protocol::LineSource;
use crate::pipeline::{PipelineConfig, PipelineController, StdoutSink};
use crate::utils::config::PackagePaths;
use crate::utils::{Colors, apply_file_to_opts, load_parsim_toml, setup_logging};

/// Defaults, then the config file, then CLI flags.
pub fn build_opts(cli: &Cli) -> Result<Opts> {
    let mut opts = Opts::default();
    let (path, required) = match &cli.config {
        Some(p) => (p.clone(), true),
        None => (PathBuf::from(PackagePaths::get().config_filename()), false),
    };
    if let Some(file) = load_parsim_toml(&path, required)? {
        apply_file_to_opts(&file, &mut opts)?;
        opts.config_path = Some(path);
    }
    apply_cli_to_opts(cli, &mut opts);
    Ok(opts)
}

fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    for spec in &cli.services {
        opts.services.insert(spec.operation, spec.capacity);
    }
    if cli.default_capacity.is_some() {
        opts.default_capacity = cli.default_capacity;
    }
    if cli.backend_capacity.is_some() {
        opts.backend_capacity = cli.backend_capacity;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
}

/// Run the service until `0` or end of stdin, then drain all queued work.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = build_opts(cli)?;
    setup_logging(opts.verbose);
    if let Some(p) = &opts.config_path {
        debug!("Loaded config from {}", p.display());
    }
    let config = PipelineConfig::try_from(&opts)?;

    ctrlc::set_handler(|| {
        warn!("Interrupted; exiting without draining queued work");
        std::process::exit(130);
    })
    .context("set Ctrl+C handler")?;

    let controller = PipelineController::configure(&config, StdoutSink::stdout())
        .context("start services")?;
    debug!(
        "Services ready: {:?}",
        controller.registry().active_operations()
    );

    let mut source = LineSource::new(io::stdin().lock());
    let summary = controller.serve(&mut source);
    debug!("End of input; draining queues...");
    let report = controller.shutdown()?;

    info!(
        "{} | {} | {}",
        Colors::colorize(Colors::EMITTED, &format!("Results: {}", report.emitted)),
        Colors::colorize(Colors::FAILED, &format!("Failed: {}", report.failed)),
        Colors::colorize(
            Colors::REJECTED,
            &format!("Rejected: {}", summary.rejected + source.rejected())
        )
    );
    Ok(())
}
