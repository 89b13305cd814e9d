//! Parsim: parallel computation service simulator.
//!
//! Requests fan out to one bounded queue per operation type; each queue is drained by its own
//! worker thread, which sleeps the requested delay, computes, and forwards the result to a
//! shared bounded result queue drained by a single result worker.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use engine::operations::OperationType;
pub use error::{ComputeError, ConfigError, PipelineError, ProtocolError};
pub use pipeline::{PipelineConfig, PipelineController, RequestSource, ResultSink, ShutdownReport};
pub use types::*;

use log::debug;

/// Result alias used by public parsim API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: start the services in `config`, route every request from `source`,
/// then drain and stop. Results reach `sink` in completion order.
///
/// Rejected requests (service not started) are logged and skipped.
///
/// ```ignore
/// let config = PipelineConfig::new().with_service(OperationType::Sum, Some(4));
/// let (tx, rx) = crossbeam_channel::unbounded();
/// let report = parsim::run_requests(&config, requests.into_iter(), tx)?;
/// ```
pub fn run_requests<R, S>(config: &PipelineConfig, mut source: R, sink: S) -> Result<ShutdownReport>
where
    R: RequestSource,
    S: ResultSink,
{
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        config
    );
    let controller = PipelineController::configure(config, sink)?;
    let summary = controller.serve(&mut source);
    debug!(
        "served {} requests ({} rejected)",
        summary.routed, summary.rejected
    );
    Ok(controller.shutdown()?)
}
