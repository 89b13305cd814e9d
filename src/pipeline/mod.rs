//! Pipeline components: bounded queues, operation workers, registry, result worker, controller.

pub mod context;
pub mod orchestrator;
pub mod queue;
pub mod registry;
pub mod result_worker;
pub mod source;
pub mod worker;

pub use context::PipelineConfig;
pub use orchestrator::{PipelineController, ServeSummary, ShutdownReport, reconcile_delays};
pub use queue::{BoundedQueue, QueueConsumer, QueueProducer};
pub use registry::OperationRegistry;
pub use result_worker::{ResultSink, ResultStats, StdoutSink, spawn_result_worker};
pub use source::RequestSource;
pub use worker::OperationWorker;
