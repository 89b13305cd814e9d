//! Typed error conditions for the pipeline, the request protocol and configuration.

use crate::engine::operations::OperationType;

/// Failures raised by queues, workers and the controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("unrecognized operation: {id}")]
    UnknownOperation { id: String },
    #[error("service not initialized: {operation}")]
    ServiceNotInitialized { operation: OperationType },
    #[error("service already started: {operation}")]
    AlreadyActive { operation: OperationType },
    #[error("queue capacity must be at least 1 (got {capacity})")]
    InvalidCapacity { capacity: usize },
    #[error("queue closed")]
    QueueClosed,
    #[error("failed to spawn worker thread {name}: {reason}")]
    SpawnFailed { name: String, reason: String },
    #[error("worker thread panicked: {name}")]
    WorkerPanicked { name: String },
}

/// Per-item computation failure. Carried inside the result record; never stops a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComputeError {
    #[error("division by zero in {operation}")]
    DivisionByZero { operation: OperationType },
}

/// Malformed request lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Syntax Error. Try again")]
    Syntax,
    #[error("Message Error. Try Again ({reason})")]
    Message { reason: String },
    #[error("Error. There is a number too big to cast: {value}")]
    Conversion { value: String },
}

impl ProtocolError {
    pub(crate) fn message(reason: impl Into<String>) -> Self {
        ProtocolError::Message {
            reason: reason.into(),
        }
    }
}

/// Startup configuration problems. Fatal before any worker starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one service must be started")]
    NoServices,
    #[error("invalid queue capacity for {target}: {capacity} (must be at least 1)")]
    InvalidCapacity { target: String, capacity: usize },
    #[error("invalid service spec '{spec}': {reason}")]
    InvalidServiceSpec { spec: String, reason: String },
}
