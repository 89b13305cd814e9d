//! Fixed-capacity FIFO with blocking put/get. Thin wrapper over a crossbeam bounded channel.
//!
//! `put` blocks while the queue holds `capacity` items; `get` blocks while it is empty.
//! Closing is implicit: once every [`QueueProducer`] is dropped the consumer drains what is
//! left and then `get` returns `None`.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::error::PipelineError;

/// Both ends of one bounded queue. Use [`BoundedQueue::split`] to hand the ends to different threads.
pub struct BoundedQueue<T> {
    producer: QueueProducer<T>,
    consumer: QueueConsumer<T>,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Result<Self, PipelineError> {
        if capacity == 0 {
            return Err(PipelineError::InvalidCapacity { capacity });
        }
        let (tx, rx) = bounded::<T>(capacity);
        Ok(Self {
            producer: QueueProducer { tx, capacity },
            consumer: QueueConsumer { rx, capacity },
        })
    }

    /// Insert at the tail, blocking until a slot is free.
    pub fn put(&self, item: T) -> Result<(), PipelineError> {
        self.producer.put(item)
    }

    /// Remove the head, blocking until an item exists. Never returns `None` while this
    /// handle is alive, since it owns a producer.
    pub fn get(&self) -> Option<T> {
        self.consumer.get()
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity
    }

    pub fn len(&self) -> usize {
        self.producer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }

    /// Another producer handle onto this queue.
    pub fn producer(&self) -> QueueProducer<T> {
        self.producer.clone()
    }

    pub fn split(self) -> (QueueProducer<T>, QueueConsumer<T>) {
        (self.producer, self.consumer)
    }
}

/// Sending end. Cloneable; the queue closes when the last clone is dropped.
pub struct QueueProducer<T> {
    tx: Sender<T>,
    capacity: usize,
}

impl<T> Clone for QueueProducer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> QueueProducer<T> {
    /// Blocks while the queue is full. Fails only if the consumer is gone.
    pub fn put(&self, item: T) -> Result<(), PipelineError> {
        self.tx.send(item).map_err(|_| PipelineError::QueueClosed)
    }

    /// Non-blocking insert. Hands the item back when the queue is full or closed.
    pub fn try_put(&self, item: T) -> Result<(), T> {
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) | TrySendError::Disconnected(item) => item,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }
}

/// Receiving end. Owned by exactly one worker thread.
pub struct QueueConsumer<T> {
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> QueueConsumer<T> {
    /// Blocks until an item arrives. `None` once all producers are dropped and the queue is drained.
    pub fn get(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
