//! Public and internal types for the parsim API and pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::engine::operations::OperationType;
use crate::error::ComputeError;

/// One unit of work for a single operation worker. Immutable once queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MiddleItem {
    /// Caller-assigned correlation id; not required to be unique.
    pub sequence: u64,
    pub operand1: i64,
    pub operand2: i64,
    /// Simulated processing latency in milliseconds.
    pub delay_ms: u64,
}

/// Output of an operation worker, consumed exactly once by the result worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultItem {
    pub sequence: u64,
    pub operation: OperationType,
    pub value: Result<i64, ComputeError>,
}

/// A validated request: fan out `operations` over the same operands.
///
/// `delays` is matched positionally against `operations`; length mismatches are
/// reconciled at routing time (see [`reconcile_delays`](crate::pipeline::reconcile_delays)).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub sequence: u64,
    pub operations: Vec<OperationType>,
    pub operand1: i64,
    pub operand2: i64,
    pub delays: Vec<u64>,
}

/// Full options after merging defaults, `.parsim.toml` and CLI flags.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    /// Per-service capacity. `None` means "use the default capacity".
    pub services: BTreeMap<OperationType, Option<usize>>,
    /// Capacity applied to services started without an explicit one.
    pub default_capacity: Option<usize>,
    /// Capacity of the shared result queue. When None, 1.
    pub backend_capacity: Option<usize>,
    /// Debug logging.
    pub verbose: bool,
    /// Config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
}
