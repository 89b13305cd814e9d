//! Pipeline tests: bounded queue semantics, worker lifecycle, routing, end-to-end ordering.

use crossbeam_channel::{Receiver, unbounded};
use parsim::pipeline::{
    BoundedQueue, OperationRegistry, OperationWorker, PipelineConfig, PipelineController,
    ResultSink, StdoutSink,
};
use parsim::utils::config::PackagePaths;
use parsim::{ComputeError, MiddleItem, OperationType, PipelineError, Request, ResultItem};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use OperationType::*;

fn item(sequence: u64, operand1: i64, operand2: i64, delay_ms: u64) -> MiddleItem {
    MiddleItem {
        sequence,
        operand1,
        operand2,
        delay_ms,
    }
}

fn request(sequence: u64, operations: &[OperationType], a: i64, b: i64, delays: &[u64]) -> Request {
    Request {
        sequence,
        operations: operations.to_vec(),
        operand1: a,
        operand2: b,
        delays: delays.to_vec(),
    }
}

fn start(config: &PipelineConfig) -> (PipelineController, Receiver<ResultItem>) {
    let (tx, rx) = unbounded::<ResultItem>();
    let controller = PipelineController::configure(config, tx).unwrap();
    (controller, rx)
}

// --- BoundedQueue ---

#[test]
fn test_queue_rejects_zero_capacity() {
    assert_eq!(
        BoundedQueue::<u32>::new(0).err(),
        Some(PipelineError::InvalidCapacity { capacity: 0 })
    );
}

#[test]
fn test_queue_fifo() {
    let queue = BoundedQueue::new(3).unwrap();
    for i in 0..3 {
        queue.put(i).unwrap();
    }
    assert!(queue.is_full());
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.get(), Some(0));
    assert_eq!(queue.get(), Some(1));
    assert_eq!(queue.get(), Some(2));
    assert!(queue.is_empty());
}

#[test]
fn test_queue_put_blocks_until_get() {
    let queue = BoundedQueue::new(2).unwrap();
    queue.put(1).unwrap();
    queue.put(2).unwrap();

    let producer = queue.producer();
    let (done_tx, done_rx) = unbounded();
    let handle = thread::spawn(move || {
        producer.put(3).unwrap();
        done_tx.send(()).unwrap();
    });

    // Full: the third put must not complete.
    assert!(done_rx.recv_timeout(Duration::from_millis(150)).is_err());
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.get(), Some(1));
    assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    handle.join().unwrap();
    assert_eq!(queue.get(), Some(2));
    assert_eq!(queue.get(), Some(3));
}

#[test]
fn test_queue_try_put_hands_back_item_when_full() {
    let queue = BoundedQueue::new(1).unwrap();
    let producer = queue.producer();
    assert_eq!(producer.try_put("a"), Ok(()));
    assert_eq!(producer.try_put("b"), Err("b"));
    assert_eq!(queue.get(), Some("a"));
}

#[test]
fn test_queue_drains_then_closes_when_producers_drop() {
    let (producer, consumer) = BoundedQueue::new(4).unwrap().split();
    let second = producer.clone();
    producer.put(1).unwrap();
    second.put(2).unwrap();
    drop(producer);
    drop(second);
    assert_eq!(consumer.get(), Some(1));
    assert_eq!(consumer.get(), Some(2));
    assert_eq!(consumer.get(), None);
}

#[test]
fn test_queue_put_fails_when_consumer_gone() {
    let (producer, consumer) = BoundedQueue::new(1).unwrap().split();
    drop(consumer);
    assert_eq!(producer.put(1), Err(PipelineError::QueueClosed));
}

#[test]
fn test_queue_concurrent_producers_deliver_each_item_once() {
    let (producer, consumer) = BoundedQueue::new(3).unwrap().split();
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let producer = producer.clone();
            thread::spawn(move || {
                for i in 0..250u64 {
                    producer.put(t * 1000 + i).unwrap();
                    assert!(producer.len() <= producer.capacity());
                }
            })
        })
        .collect();
    drop(producer);

    let mut seen = HashSet::new();
    let mut last_per_producer = [None::<u64>; 4];
    while let Some(v) = consumer.get() {
        assert!(consumer.len() <= 3);
        assert!(seen.insert(v), "duplicate {v}");
        let slot = &mut last_per_producer[(v / 1000) as usize];
        // Per-producer order is preserved.
        assert!(slot.is_none_or(|prev| prev < v));
        *slot = Some(v);
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(seen.len(), 1000);
}

// --- OperationWorker ---

#[test]
fn test_worker_submit_before_activate_fails() {
    let worker = OperationWorker::new(Sum);
    assert!(!worker.is_active());
    assert_eq!(
        worker.submit(item(1, 1, 1, 0)),
        Err(PipelineError::ServiceNotInitialized { operation: Sum })
    );
}

#[test]
fn test_worker_activate_twice_rejected() {
    let (results, _rx) = BoundedQueue::<ResultItem>::new(4).unwrap().split();
    let mut worker = OperationWorker::new(Sub);
    worker.activate(2, results.clone()).unwrap();
    assert!(worker.is_active());
    assert_eq!(worker.capacity(), 2);
    assert_eq!(
        worker.activate(2, results),
        Err(PipelineError::AlreadyActive { operation: Sub })
    );
    worker.close_and_join().unwrap();
    assert!(worker.is_active());
    assert_eq!(
        worker.submit(item(1, 1, 1, 0)),
        Err(PipelineError::QueueClosed)
    );
}

#[test]
fn test_worker_queue_never_exceeds_capacity() {
    let (results, results_rx) = BoundedQueue::<ResultItem>::new(64).unwrap().split();
    let mut worker = OperationWorker::new(Sum);
    worker.activate(3, results).unwrap();

    thread::scope(|s| {
        for t in 0..4u64 {
            let worker = &worker;
            s.spawn(move || {
                for i in 0..10u64 {
                    worker.submit(item(t * 100 + i, 1, 2, 1)).unwrap();
                    assert!(worker.queued() <= 3);
                }
            });
        }
        for _ in 0..40 {
            assert!(worker.queued() <= 3);
            let r = results_rx.get().unwrap();
            assert_eq!(r.value, Ok(3));
        }
    });
    assert_eq!(worker.close_and_join().unwrap(), 40);
}

#[test]
fn test_worker_division_by_zero_does_not_stop_worker() {
    let (results, results_rx) = BoundedQueue::<ResultItem>::new(4).unwrap().split();
    let mut worker = OperationWorker::new(Div);
    worker.activate(2, results).unwrap();
    worker.submit(item(1, 10, 0, 0)).unwrap();
    worker.submit(item(2, 10, 3, 0)).unwrap();

    let first = results_rx.get().unwrap();
    assert_eq!(first.sequence, 1);
    assert_eq!(
        first.value,
        Err(ComputeError::DivisionByZero { operation: Div })
    );
    let second = results_rx.get().unwrap();
    assert_eq!(second.sequence, 2);
    assert_eq!(second.value, Ok(3));
    assert_eq!(worker.close_and_join().unwrap(), 2);
}

// --- OperationRegistry ---

#[test]
fn test_registry_lookup_and_activation() {
    let (results, _rx) = BoundedQueue::<ResultItem>::new(1).unwrap().split();
    let mut registry = OperationRegistry::new();
    assert!(registry.is_empty());
    registry.activate(Xor, 1, results.clone()).unwrap();
    registry.activate(And, 2, results.clone()).unwrap();

    assert!(registry.is_active(Xor));
    assert!(!registry.is_active(Or));
    assert_eq!(registry.active_operations(), vec![And, Xor]);
    assert_eq!(registry.lookup(And).unwrap().capacity(), 2);
    assert_eq!(registry.lookup_id("7").unwrap().operation(), Xor);
    assert_eq!(
        registry.lookup(Or).err(),
        Some(PipelineError::ServiceNotInitialized { operation: Or })
    );
    assert!(matches!(
        registry.lookup_id("42").err(),
        Some(PipelineError::UnknownOperation { .. })
    ));
    assert_eq!(
        registry.activate(Xor, 1, results).err(),
        Some(PipelineError::AlreadyActive { operation: Xor })
    );
    assert_eq!(registry.close_and_join_all().unwrap(), 0);
}

// --- PipelineController ---

#[test]
fn test_configure_without_services_fails_before_start() {
    let (tx, _rx) = unbounded::<ResultItem>();
    assert!(PipelineController::configure(&PipelineConfig::new(), tx).is_err());
}

#[test]
fn test_end_to_end_sum_and_mult() {
    let config = PipelineConfig::new()
        .with_service(Sum, Some(2))
        .with_service(Mult, Some(2));
    let (controller, rx) = start(&config);

    let routed = controller
        .route(&request(1, &[Sum, Mult], 10, 5, &[5, 1]))
        .unwrap();
    assert_eq!(routed, 2);

    let report = controller.shutdown().unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.emitted, 2);
    assert_eq!(report.failed, 0);

    let mut results: Vec<ResultItem> = rx.try_iter().collect();
    results.sort_by_key(|r| r.operation);
    assert_eq!(
        results,
        vec![
            ResultItem {
                sequence: 1,
                operation: Sum,
                value: Ok(15)
            },
            ResultItem {
                sequence: 1,
                operation: Mult,
                value: Ok(50)
            },
        ]
    );
}

#[test]
fn test_fast_operation_overtakes_slow_one() {
    let config = PipelineConfig::new()
        .with_service(Div, None)
        .with_service(Or, None);
    let (controller, rx) = start(&config);

    controller
        .route(&request(1, &[Div, Or], 8, 2, &[400, 0]))
        .unwrap();
    let report = controller.shutdown().unwrap();
    assert_eq!(report.emitted, 2);

    let order: Vec<OperationType> = rx.try_iter().map(|r| r.operation).collect();
    assert_eq!(order, vec![Or, Div]);
}

#[test]
fn test_fifo_within_one_operation() {
    let config = PipelineConfig::new().with_service(Sum, Some(2));
    let (controller, rx) = start(&config);

    // Earlier items are slower; order must still follow submission.
    for (seq, delay) in [(1, 40), (2, 0), (3, 20), (4, 0), (5, 5)] {
        controller
            .route(&request(seq, &[Sum], seq as i64, 1, &[delay]))
            .unwrap();
    }
    controller.shutdown().unwrap();

    let seqs: Vec<u64> = rx.try_iter().map(|r| r.sequence).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_route_to_inactive_operation_rejects_whole_request() {
    let config = PipelineConfig::new().with_service(Sum, Some(4));
    let (controller, rx) = start(&config);

    assert_eq!(
        controller.route(&request(9, &[Sum, Div], 1, 2, &[0])),
        Err(PipelineError::ServiceNotInitialized { operation: Div })
    );
    let report = controller.shutdown().unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn test_route_pads_delays_across_operations() {
    let config = PipelineConfig::new()
        .with_service(Sum, None)
        .with_service(Sub, None)
        .with_service(Mult, None);
    let (controller, rx) = start(&config);

    assert_eq!(
        controller
            .route(&request(2, &[Sum, Sub, Mult], 3, 4, &[10, 20]))
            .unwrap(),
        3
    );
    controller.shutdown().unwrap();

    let mut values: Vec<(OperationType, i64)> = rx
        .try_iter()
        .map(|r| (r.operation, r.value.unwrap()))
        .collect();
    values.sort();
    assert_eq!(values, vec![(Sum, 7), (Sub, -1), (Mult, 12)]);
}

#[test]
fn test_serve_counts_rejections_and_reports_compute_errors() {
    let config = PipelineConfig::new()
        .with_service(Mod, Some(2))
        .with_backend_capacity(1);
    let (controller, rx) = start(&config);

    let mut source = vec![
        request(1, &[Mod], 7, 2, &[0]),
        request(2, &[Nor], 7, 2, &[0]),
        request(3, &[Mod], 7, 0, &[0]),
    ]
    .into_iter();
    let summary = controller.serve(&mut source);
    assert_eq!(summary.routed, 2);
    assert_eq!(summary.rejected, 1);

    let report = controller.shutdown().unwrap();
    assert_eq!(report.emitted, 1);
    assert_eq!(report.failed, 1);

    let results: Vec<ResultItem> = rx.try_iter().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].value, Ok(1));
    assert_eq!(
        results[1].value,
        Err(ComputeError::DivisionByZero { operation: Mod })
    );
}

#[test]
fn test_concurrent_routing_produces_each_result_once() {
    let config = PipelineConfig::new()
        .with_service(And, Some(1))
        .with_service(Or, Some(3))
        .with_service(Xor, Some(2))
        .with_backend_capacity(2);
    let (controller, rx) = start(&config);

    thread::scope(|s| {
        for t in 0..4u64 {
            let controller = &controller;
            s.spawn(move || {
                for i in 0..25u64 {
                    controller
                        .route(&request(t * 100 + i, &[And, Or, Xor], 6, 3, &[0]))
                        .unwrap();
                }
            });
        }
    });
    let report = controller.shutdown().unwrap();
    assert_eq!(report.processed, 300);
    assert_eq!(report.emitted, 300);

    let mut seen = HashSet::new();
    for r in rx.try_iter() {
        let expected = match r.operation {
            And => 2,
            Or => 7,
            Xor => 5,
            other => panic!("unexpected operation {other}"),
        };
        assert_eq!(r.value, Ok(expected));
        assert!(seen.insert((r.sequence, r.operation)));
    }
    assert_eq!(seen.len(), 300);
}

#[test]
fn test_run_requests_with_stdout_sink_format() {
    let config = PipelineConfig::new().with_service(Sub, None);
    let (tx, rx) = unbounded::<Vec<u8>>();

    struct ForwardOnDrop(Vec<u8>, crossbeam_channel::Sender<Vec<u8>>);
    impl std::io::Write for ForwardOnDrop {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    impl Drop for ForwardOnDrop {
        fn drop(&mut self) {
            let _ = self.1.send(std::mem::take(&mut self.0));
        }
    }

    let sink = StdoutSink::new(ForwardOnDrop(Vec::new(), tx));
    let requests = vec![request(5, &[Sub], 3, 4, &[0]), request(6, &[Sub], -2, -2, &[0])];
    let report = parsim::run_requests(&config, requests.into_iter(), sink).unwrap();
    assert_eq!(report.emitted, 2);

    let out = String::from_utf8(rx.recv().unwrap()).unwrap();
    assert_eq!(out, "5:1:-1\n6:1:0\n");
}

#[test]
fn test_results_reported_from_named_worker_thread() {
    struct ThreadNameSink(crossbeam_channel::Sender<Option<String>>);
    impl ResultSink for ThreadNameSink {
        fn on_result(&mut self, _sequence: u64, _operation: OperationType, _value: i64) {
            let _ = self.0.send(thread::current().name().map(str::to_string));
        }
    }

    let (tx, rx) = unbounded();
    let config = PipelineConfig::new().with_service(Or, None);
    let controller = PipelineController::configure(&config, ThreadNameSink(tx)).unwrap();
    controller.route(&request(1, &[Or], 6, 3, &[0])).unwrap();
    controller.shutdown().unwrap();

    assert_eq!(PackagePaths::get().pkg_name(), "parsim");
    assert_eq!(rx.recv().unwrap().as_deref(), Some("parsim-results"));
}
