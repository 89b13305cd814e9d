use log::{debug, error};
use std::thread::JoinHandle;

use crate::error::PipelineError;
use crate::pipeline::context::PipelineConfig;
use crate::pipeline::queue::{BoundedQueue, QueueProducer};
use crate::pipeline::registry::OperationRegistry;
use crate::pipeline::result_worker::{
    ResultSink, ResultStats, result_thread_name, spawn_result_worker,
};
use crate::pipeline::source::RequestSource;
use crate::{MiddleItem, Request, ResultItem};

/// Counts returned by [`PipelineController::shutdown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Items computed across all operation workers.
    pub processed: u64,
    /// Results reported to the sink with a value.
    pub emitted: u64,
    /// Results reported to the sink as computation errors.
    pub failed: u64,
}

/// Counts returned by [`PipelineController::serve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServeSummary {
    pub routed: usize,
    pub rejected: usize,
}

/// Owns the registry, the shared result queue and every worker thread.
///
/// Request source → `route` (fan-out) → operation queues → operation workers
/// → result queue → result worker → sink.
pub struct PipelineController {
    registry: OperationRegistry,
    results: Option<QueueProducer<ResultItem>>,
    result_handle: Option<JoinHandle<ResultStats>>,
}

impl PipelineController {
    /// Validate `config`, start the result worker, then one worker per enabled operation.
    pub fn configure<S: ResultSink>(config: &PipelineConfig, sink: S) -> crate::Result<Self> {
        config.validate()?;

        let (results_tx, results_rx) =
            BoundedQueue::<ResultItem>::new(config.backend_capacity())?.split();
        let result_handle = spawn_result_worker(results_rx, sink)?;

        let mut registry = OperationRegistry::new();
        for op in config.enabled_operations() {
            let capacity = config.resolve_capacity(op);
            registry.activate(op, capacity, results_tx.clone())?;
        }
        debug!(
            "pipeline started: services {:?}, result queue capacity {}",
            registry.active_operations(),
            config.backend_capacity()
        );

        Ok(Self {
            registry,
            results: Some(results_tx),
            result_handle: Some(result_handle),
        })
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Fan one request out to its operation queues. Returns the number of items submitted.
    ///
    /// Every requested operation must be started; otherwise nothing is submitted.
    /// Blocks while any target queue is full.
    pub fn route(&self, request: &Request) -> Result<usize, PipelineError> {
        let delays = reconcile_delays(request.operations.len(), &request.delays);

        let workers = request
            .operations
            .iter()
            .map(|op| self.registry.lookup(*op))
            .collect::<Result<Vec<_>, _>>()?;

        for (worker, delay_ms) in workers.iter().zip(delays) {
            worker.submit(MiddleItem {
                sequence: request.sequence,
                operand1: request.operand1,
                operand2: request.operand2,
                delay_ms,
            })?;
        }
        debug!(
            "routed sequence {} to {} service(s)",
            request.sequence,
            workers.len()
        );
        Ok(workers.len())
    }

    /// Route every request from `source` until it reports end of input.
    /// Rejected requests are logged and skipped.
    pub fn serve<R: RequestSource + ?Sized>(&self, source: &mut R) -> ServeSummary {
        let mut summary = ServeSummary::default();
        while let Some(request) = source.next_request() {
            match self.route(&request) {
                Ok(_) => summary.routed += 1,
                Err(e) => {
                    error!("sequence {}: {}", request.sequence, e);
                    summary.rejected += 1;
                }
            }
        }
        summary
    }

    /// Drain and stop: close operation queues, join their workers, then close the result
    /// queue and join the result worker. Every item already queued is processed and reported.
    pub fn shutdown(mut self) -> Result<ShutdownReport, PipelineError> {
        let processed = self.registry.close_and_join_all();
        drop(self.results.take());
        let stats = match self.result_handle.take() {
            Some(handle) => handle.join().map_err(|_| PipelineError::WorkerPanicked {
                name: result_thread_name(),
            })?,
            None => ResultStats::default(),
        };
        let report = ShutdownReport {
            processed: processed?,
            emitted: stats.emitted,
            failed: stats.failed,
        };
        debug!("pipeline stopped: {:?}", report);
        Ok(report)
    }
}

/// Match the delay list to `count` operations: drop extra trailing delays, or repeat the
/// last delay to pad. An empty list pads with 0.
pub fn reconcile_delays(count: usize, delays: &[u64]) -> Vec<u64> {
    let mut out: Vec<u64> = delays.iter().copied().take(count).collect();
    let pad = out.last().copied().unwrap_or(0);
    out.resize(count, pad);
    out
}
