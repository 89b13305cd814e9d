use log::{debug, warn};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::engine::operations::OperationType;
use crate::error::PipelineError;
use crate::pipeline::queue::{BoundedQueue, QueueConsumer, QueueProducer};
use crate::utils::config::PackagePaths;
use crate::{MiddleItem, ResultItem};

/// One worker per operation type: an inbound bounded queue and the single thread draining it.
pub struct OperationWorker {
    operation: OperationType,
    active: bool,
    capacity: usize,
    inbound: Option<QueueProducer<MiddleItem>>,
    handle: Option<JoinHandle<u64>>,
}

impl OperationWorker {
    pub fn new(operation: OperationType) -> Self {
        Self {
            operation,
            active: false,
            capacity: 0,
            inbound: None,
            handle: None,
        }
    }

    pub fn operation(&self) -> OperationType {
        self.operation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Inbound queue bound; 0 until activated.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items waiting in the inbound queue (not counting the one being computed).
    pub fn queued(&self) -> usize {
        self.inbound.as_ref().map_or(0, QueueProducer::len)
    }

    /// Allocate the inbound queue and start the consuming thread. Results go to `results`.
    /// A worker is started at most once.
    pub fn activate(
        &mut self,
        capacity: usize,
        results: QueueProducer<ResultItem>,
    ) -> Result<(), PipelineError> {
        if self.active {
            return Err(PipelineError::AlreadyActive {
                operation: self.operation,
            });
        }
        let (inbound_tx, inbound_rx) = BoundedQueue::<MiddleItem>::new(capacity)?.split();
        let operation = self.operation;
        let name = thread_name(operation);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || operation_worker_loop(operation, inbound_rx, results))
            .map_err(|e| PipelineError::SpawnFailed {
                name,
                reason: e.to_string(),
            })?;
        debug!("{operation} worker started (capacity {capacity})");
        self.capacity = capacity;
        self.inbound = Some(inbound_tx);
        self.handle = Some(handle);
        self.active = true;
        Ok(())
    }

    /// Enqueue one item, blocking while the inbound queue is full.
    pub fn submit(&self, item: MiddleItem) -> Result<(), PipelineError> {
        match &self.inbound {
            Some(inbound) => inbound.put(item),
            None if self.active => Err(PipelineError::QueueClosed),
            None => Err(PipelineError::ServiceNotInitialized {
                operation: self.operation,
            }),
        }
    }

    /// Close the inbound queue, let the thread drain it, and join. Returns items processed.
    /// The worker stays marked active; further submits fail with `QueueClosed`.
    pub fn close_and_join(&mut self) -> Result<u64, PipelineError> {
        drop(self.inbound.take());
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        handle.join().map_err(|_| PipelineError::WorkerPanicked {
            name: thread_name(self.operation),
        })
    }
}

fn thread_name(operation: OperationType) -> String {
    format!(
        "{}-{}",
        PackagePaths::get().pkg_name(),
        operation.name().to_lowercase()
    )
}

/// Consume items in FIFO order: sleep the item's delay, compute, forward the result.
/// Exits when the inbound queue is closed and drained, or when the result queue is gone.
fn operation_worker_loop(
    operation: OperationType,
    inbound: QueueConsumer<MiddleItem>,
    results: QueueProducer<ResultItem>,
) -> u64 {
    let mut processed = 0_u64;
    while let Some(item) = inbound.get() {
        if item.delay_ms > 0 {
            thread::sleep(Duration::from_millis(item.delay_ms));
        }
        let result = ResultItem {
            sequence: item.sequence,
            operation,
            value: operation.apply(item.operand1, item.operand2),
        };
        if results.put(result).is_err() {
            warn!(
                "{operation} worker: result queue closed, dropping sequence {}",
                item.sequence
            );
            break;
        }
        processed += 1;
    }
    debug!("{operation} worker stopped after {processed} items");
    processed
}
