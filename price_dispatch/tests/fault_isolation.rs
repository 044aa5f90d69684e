mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use price_common::{DispatchError, PriceEvent, Ticker};
use price_dispatch::{
    DrainStatus, MaxPriceConsumer, PricePublisher, Publisher, PublisherConfig, Subscription,
};

use common::{Recorder, init_logger, tickers};

const WAIT: Duration = Duration::from_secs(5);

fn publisher(workers: usize, queue_capacity: usize, drain_timeout_ms: u64) -> PricePublisher {
    PricePublisher::new(PublisherConfig {
        workers,
        queue_capacity,
        drain_timeout_ms,
    })
    .unwrap()
}

#[test]
fn concurrent_publishes_never_exceed_demand() {
    init_logger();
    let publisher = Arc::new(publisher(8, 4096, 1000));
    let recorder = Arc::new(Recorder::new("bounded", &[Ticker::AAPL], 10));
    publisher.subscribe(recorder.clone());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let publisher = Arc::clone(&publisher);
            thread::spawn(move || {
                for i in 0..100 {
                    publisher.publish(PriceEvent::new(Ticker::AAPL, (worker * 100 + i) as f64));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(publisher.wait_idle(WAIT).is_completed());

    assert_eq!(recorder.delivered_count(), 10);
    assert_eq!(recorder.subscription().demand(), 0);
}

#[test]
fn failing_subscriber_does_not_affect_others() {
    init_logger();
    let publisher = publisher(4, 64, 1000);
    let faulty = Arc::new(Recorder::new("faulty", &[Ticker::AAPL], 1).failing());
    let healthy = Arc::new(MaxPriceConsumer::new("healthy", tickers(&[Ticker::AAPL])));
    publisher.subscribe(faulty.clone());
    publisher.subscribe(healthy.clone());

    assert_eq!(publisher.publish(PriceEvent::new(Ticker::AAPL, 42.0)), 2);
    assert!(publisher.wait_idle(WAIT).is_completed());

    assert_eq!(healthy.max_value(Ticker::AAPL).unwrap(), 42.0);
    assert_eq!(healthy.error_count(), 0);
    // The failed delivery hands its unit of demand back.
    assert_eq!(faulty.subscription().demand(), 1);
    let errors = faulty.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        DispatchError::DeliveryFailure { subscriber, .. } if subscriber == "faulty"
    ));
}

#[test]
fn rejected_submission_is_reported_per_subscriber() {
    init_logger();
    let publisher = publisher(1, 1, 1000);
    let (started_tx, started_rx) = bounded::<()>(8);
    let (release_tx, release_rx) = bounded::<()>(8);
    let gated = Arc::new(
        Recorder::new("gated", &[Ticker::AAPL], 100).gated(started_tx, release_rx),
    );
    publisher.subscribe(gated.clone());

    // First task occupies the only worker.
    assert_eq!(publisher.publish(PriceEvent::new(Ticker::AAPL, 1.0)), 1);
    started_rx.recv_timeout(WAIT).unwrap();
    // Second fills the queue, third is rejected.
    assert_eq!(publisher.publish(PriceEvent::new(Ticker::AAPL, 2.0)), 1);
    assert_eq!(publisher.publish(PriceEvent::new(Ticker::AAPL, 3.0)), 0);

    {
        let errors = gated.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DispatchError::SubmissionFailure(_)));
    }

    release_tx.send(()).unwrap();
    release_tx.send(()).unwrap();
    assert!(publisher.shutdown().is_completed());
    assert_eq!(gated.delivered_count(), 2);
}

#[test]
fn shutdown_completes_each_subscriber_once() {
    init_logger();
    let publisher = publisher(2, 16, 1000);
    let recorders: Vec<Arc<Recorder>> = (0..3)
        .map(|i| Arc::new(Recorder::new(&format!("recorder-{}", i), &[Ticker::KO], 1)))
        .collect();
    for recorder in &recorders {
        publisher.subscribe(recorder.clone());
    }

    assert_eq!(publisher.shutdown(), DrainStatus::Completed);
    publisher.shutdown();

    for recorder in &recorders {
        assert_eq!(recorder.completions.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn shutdown_reports_drain_timeout() {
    init_logger();
    let publisher = publisher(1, 4, 50);
    let (started_tx, started_rx) = bounded::<()>(8);
    let (release_tx, release_rx) = bounded::<()>(8);
    let gated = Arc::new(
        Recorder::new("stuck", &[Ticker::PG], 1).gated(started_tx, release_rx),
    );
    publisher.subscribe(gated.clone());

    publisher.publish(PriceEvent::new(Ticker::PG, 1.0));
    started_rx.recv_timeout(WAIT).unwrap();

    let status = publisher.shutdown();
    assert_eq!(status, DrainStatus::TimedOut { pending: 1 });
    assert_eq!(gated.completions.load(Ordering::SeqCst), 1);

    release_tx.send(()).unwrap();
}

#[test]
fn subscribe_racing_shutdown_is_rejected_not_orphaned() {
    init_logger();
    let publisher = Arc::new(publisher(1, 4, 1000));
    let (started_tx, started_rx) = bounded::<()>(1);
    let (release_tx, release_rx) = bounded::<()>(1);
    let late = Arc::new(
        Recorder::new("late", &[Ticker::AAPL], 1).gated_subscribe(started_tx, release_rx),
    );

    let subscribing = {
        let publisher = Arc::clone(&publisher);
        let late = Arc::clone(&late);
        thread::spawn(move || publisher.subscribe(late))
    };
    // `on_subscribe` is running: the early shutdown check has already passed.
    started_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(publisher.shutdown(), DrainStatus::Completed);
    release_tx.send(()).unwrap();
    subscribing.join().unwrap();

    assert_eq!(publisher.subscriber_count(), 0);
    assert_eq!(late.completions.load(Ordering::SeqCst), 0);
    assert!(late.subscription().is_cancelled());
    let errors = late.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], DispatchError::SubmissionFailure(_)));
}
