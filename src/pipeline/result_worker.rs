//! The single result worker and the sinks it reports to.

use crossbeam_channel::Sender;
use log::{debug, error};
use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crate::ResultItem;
use crate::engine::operations::OperationType;
use crate::error::{ComputeError, PipelineError};
use crate::pipeline::queue::QueueConsumer;
use crate::utils::config::PackagePaths;

/// Receives result records in completion order, one call per processed item.
pub trait ResultSink: Send + 'static {
    fn on_result(&mut self, sequence: u64, operation: OperationType, value: i64);

    fn on_error(&mut self, sequence: u64, operation: OperationType, err: &ComputeError) {
        error!("{}:{}: {}", sequence, operation.id(), err);
    }
}

/// Writes `sequence:operation_id:value` lines and flushes each one.
pub struct StdoutSink<W: Write + Send + 'static> {
    out: W,
}

impl StdoutSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send + 'static> StdoutSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send + 'static> ResultSink for StdoutSink<W> {
    fn on_result(&mut self, sequence: u64, operation: OperationType, value: i64) {
        let written = writeln!(self.out, "{}:{}:{}", sequence, operation.id(), value)
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            error!("write result {sequence}:{}: {e}", operation.id());
        }
    }
}

/// Forward records to a channel (library embedders, tests).
impl ResultSink for Sender<ResultItem> {
    fn on_result(&mut self, sequence: u64, operation: OperationType, value: i64) {
        let _ = self.send(ResultItem {
            sequence,
            operation,
            value: Ok(value),
        });
    }

    fn on_error(&mut self, sequence: u64, operation: OperationType, err: &ComputeError) {
        let _ = self.send(ResultItem {
            sequence,
            operation,
            value: Err(*err),
        });
    }
}

/// Counts reported by the result worker when it exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResultStats {
    pub emitted: u64,
    pub failed: u64,
}

/// Start the result worker thread. It exits once every producer of `results` is dropped
/// and the queue is drained.
pub fn spawn_result_worker<S: ResultSink>(
    results: QueueConsumer<ResultItem>,
    sink: S,
) -> Result<JoinHandle<ResultStats>, PipelineError> {
    let name = result_thread_name();
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || result_worker_loop(results, sink))
        .map_err(|e| PipelineError::SpawnFailed {
            name,
            reason: e.to_string(),
        })
}

pub(crate) fn result_thread_name() -> String {
    format!("{}-results", PackagePaths::get().pkg_name())
}

fn result_worker_loop<S: ResultSink>(results: QueueConsumer<ResultItem>, mut sink: S) -> ResultStats {
    let mut stats = ResultStats::default();
    while let Some(item) = results.get() {
        match item.value {
            Ok(value) => {
                sink.on_result(item.sequence, item.operation, value);
                stats.emitted += 1;
            }
            Err(err) => {
                sink.on_error(item.sequence, item.operation, &err);
                stats.failed += 1;
            }
        }
    }
    debug!(
        "result worker stopped: {} emitted, {} failed",
        stats.emitted, stats.failed
    );
    stats
}
