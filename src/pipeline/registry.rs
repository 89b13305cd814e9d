//! Operation type → worker mapping. Populated once at startup, read-only while routing.

use log::debug;
use std::collections::HashMap;

use crate::ResultItem;
use crate::engine::operations::OperationType;
use crate::error::PipelineError;
use crate::pipeline::queue::QueueProducer;
use crate::pipeline::worker::OperationWorker;

/// Holds exactly one worker per started operation type.
#[derive(Default)]
pub struct OperationRegistry {
    workers: HashMap<OperationType, OperationWorker>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the worker for `operation`. Fails with `AlreadyActive` if it is already running.
    pub fn activate(
        &mut self,
        operation: OperationType,
        capacity: usize,
        results: QueueProducer<ResultItem>,
    ) -> Result<(), PipelineError> {
        self.workers
            .entry(operation)
            .or_insert_with(|| OperationWorker::new(operation))
            .activate(capacity, results)
    }

    /// Worker for a started operation type.
    pub fn lookup(&self, operation: OperationType) -> Result<&OperationWorker, PipelineError> {
        self.workers
            .get(&operation)
            .filter(|w| w.is_active())
            .ok_or(PipelineError::ServiceNotInitialized { operation })
    }

    /// Like [`Self::lookup`] but from a raw identifier (numeric id or name).
    pub fn lookup_id(&self, id: &str) -> Result<&OperationWorker, PipelineError> {
        self.lookup(id.parse()?)
    }

    pub fn is_active(&self, operation: OperationType) -> bool {
        self.workers.get(&operation).is_some_and(|w| w.is_active())
    }

    /// Started operation types in id order.
    pub fn active_operations(&self) -> Vec<OperationType> {
        let mut ops: Vec<OperationType> = self
            .workers
            .values()
            .filter(|w| w.is_active())
            .map(OperationWorker::operation)
            .collect();
        ops.sort();
        ops
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Close every inbound queue and join every worker. Returns the total items processed.
    /// All workers are joined even if one panicked; the first panic is reported.
    pub fn close_and_join_all(&mut self) -> Result<u64, PipelineError> {
        let mut processed = 0_u64;
        let mut first_err = None;
        for op in self.active_operations() {
            let Some(worker) = self.workers.get_mut(&op) else {
                continue;
            };
            match worker.close_and_join() {
                Ok(n) => {
                    debug!("{op} worker joined ({n} items)");
                    processed += n;
                }
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(processed),
        }
    }
}
