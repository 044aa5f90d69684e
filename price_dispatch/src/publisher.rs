//! Price dispatch engine.
//!
//! `PricePublisher` owns the subscriber registry and the worker pool. Publishing an
//! event takes a snapshot of the registry and submits one `DispatchTask` per
//! subscriber; it never waits for delivery. Item-level routing and demand checks
//! happen inside each task, so the publisher itself only fans out.
//!
//! Registry policy: append-only under a `RwLock`. `publish` clones the list of
//! records under a short read lock and iterates the copy, so a subscriber added
//! while a publish is in progress is not part of that publish.
//!
//! Failure isolation: a rejected submission is reported to that one subscriber via
//! `on_error` and the fan-out continues with the rest.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use log::{debug, error, info, warn};
use price_common::{DispatchError, PriceEvent, Result};

use crate::config::PublisherConfig;
use crate::flow::{Publisher, Subscriber, Subscription};
use crate::model::record::SubscriberRecord;
use crate::model::subscription::PriceSubscription;
use crate::pool::{DrainStatus, WorkerPool};
use crate::task::DispatchTask;

/// Fan-out publisher for `PriceEvent`s backed by a bounded worker pool.
pub struct PricePublisher {
    registry: RwLock<Vec<Arc<SubscriberRecord>>>,
    pool: WorkerPool,
    drain_timeout: Duration,
    shut_down: AtomicBool,
}

impl PricePublisher {
    /// Build a publisher and start its worker pool.
    pub fn new(config: PublisherConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Constructing PricePublisher with {} workers",
            config.workers
        );
        let pool = WorkerPool::new(config.workers, config.queue_capacity)?;

        Ok(Self {
            registry: RwLock::new(Vec::new()),
            pool,
            drain_timeout: config.drain_timeout(),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Block until every task submitted so far has run, or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> DrainStatus {
        self.pool.wait_idle(timeout)
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn snapshot(&self) -> Vec<Arc<SubscriberRecord>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Publisher<PriceEvent> for PricePublisher {
    /// Register `subscriber`.
    ///
    /// `on_subscribe` runs on the calling thread before the subscriber is added to
    /// the registry, so it may already hold demand when this returns. The shutdown
    /// flag is checked again under the registry write lock: a subscriber that loses
    /// the race against `shutdown` is rejected rather than left uncompleted.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<PriceEvent>>) {
        if self.is_shut_down() {
            reject(subscriber.as_ref());
            return;
        }

        let subscription = Arc::new(PriceSubscription::new());
        subscriber.on_subscribe(subscription.clone());

        let record = Arc::new(SubscriberRecord::new(subscriber, subscription));
        {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            if !self.is_shut_down() {
                registry.push(Arc::clone(&record));
                info!("Added subscriber: {}", record.name());
                return;
            }
        }
        record.subscription.cancel();
        reject(record.subscriber.as_ref());
    }

    /// Fan `event` out to every registered subscriber.
    ///
    /// Returns the number of dispatch tasks accepted by the pool. After `shutdown`
    /// this is a no-op returning 0.
    fn publish(&self, event: PriceEvent) -> usize {
        if self.is_shut_down() {
            warn!("Ignoring {:?}: publisher is shut down", event);
            return 0;
        }

        let mut submitted = 0;
        for record in self.snapshot() {
            debug!("Submitting task for {:?} to {}", event, record.name());
            let task = DispatchTask::new(Arc::clone(&record), event);
            match self.pool.submit(move || {
                task.run();
            }) {
                Ok(()) => submitted += 1,
                // Lost the race against shutdown; the subscriber is already completed.
                Err(e) if self.is_shut_down() || self.pool.is_shut_down() => {
                    debug!("Dropping {:?} for {}: {}", event, record.name(), e);
                }
                Err(e) => {
                    warn!("Could not dispatch {:?} to {}: {}", event, record.name(), e);
                    record.subscriber.on_error(e);
                }
            }
        }
        submitted
    }

    /// Complete every subscriber, then stop the pool and wait for in-flight tasks.
    ///
    /// `on_complete` runs once per subscriber registered at this point. The wait is
    /// bounded by the configured drain timeout; a timeout is reported in the returned
    /// status, never raised. Calling this again only reports the pool's current state.
    fn shutdown(&self) -> DrainStatus {
        let records = {
            let registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            if self.shut_down.swap(true, Ordering::AcqRel) {
                debug!("Publisher already shut down");
                return match self.pool.pending() {
                    0 => DrainStatus::Completed,
                    pending => DrainStatus::TimedOut { pending },
                };
            }
            registry.clone()
        };

        info!("Shutting down publisher with {} subscribers", records.len());
        for record in &records {
            let subscriber = &record.subscriber;
            if panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_complete())).is_err() {
                error!("{}: on_complete panicked", subscriber.name());
            }
        }

        let status = self.pool.shutdown(self.drain_timeout);
        match status {
            DrainStatus::Completed => info!("shutdownCompleted: true"),
            DrainStatus::TimedOut { pending } => {
                warn!("shutdownCompleted: false ({} tasks still pending)", pending)
            }
        }
        status
    }
}

fn reject(subscriber: &dyn Subscriber<PriceEvent>) {
    warn!("Rejecting subscriber {}: publisher is shut down", subscriber.name());
    subscriber.on_error(DispatchError::SubmissionFailure(
        "publisher is shut down".to_string(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Subscription;
    use crate::model::consumer::MaxPriceConsumer;
    use price_common::Ticker;

    const WAIT: Duration = Duration::from_secs(5);

    fn publisher(workers: usize, queue_capacity: usize) -> PricePublisher {
        PricePublisher::new(PublisherConfig {
            workers,
            queue_capacity,
            drain_timeout_ms: 1000,
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PublisherConfig {
            workers: 0,
            ..PublisherConfig::default()
        };
        assert!(PricePublisher::new(config).is_err());
    }

    #[test]
    fn subscribe_hands_out_demand_before_returning() {
        let publisher = publisher(2, 16);
        let consumer = Arc::new(MaxPriceConsumer::new(
            "testConsumer",
            [Ticker::AAPL, Ticker::GOOGL].into_iter().collect(),
        ));

        publisher.subscribe(consumer.clone());

        assert_eq!(publisher.subscriber_count(), 1);
        let subscription = consumer.subscription().unwrap();
        assert_eq!(subscription.demand(), 1);
        assert!(subscription.has_interest(&Ticker::GOOGL));
    }

    #[test]
    fn publish_delivers_asynchronously() {
        let publisher = publisher(2, 16);
        let consumer = Arc::new(MaxPriceConsumer::new(
            "testConsumer",
            [Ticker::AAPL, Ticker::GOOGL].into_iter().collect(),
        ));
        publisher.subscribe(consumer.clone());

        assert_eq!(publisher.publish(PriceEvent::new(Ticker::AAPL, 10.0)), 1);
        assert!(publisher.wait_idle(WAIT).is_completed());

        assert_eq!(consumer.max_value(Ticker::AAPL).unwrap(), 10.0);
    }

    #[test]
    fn publish_without_subscribers_submits_nothing() {
        let publisher = publisher(1, 4);
        assert_eq!(publisher.publish(PriceEvent::new(Ticker::AAPL, 1.0)), 0);
    }

    #[test]
    fn publish_after_shutdown_is_a_no_op() {
        let publisher = publisher(2, 16);
        let consumer = Arc::new(MaxPriceConsumer::new(
            "late",
            [Ticker::AAPL].into_iter().collect(),
        ));
        publisher.subscribe(consumer.clone());

        assert!(publisher.shutdown().is_completed());
        assert_eq!(publisher.publish(PriceEvent::new(Ticker::AAPL, 10.0)), 0);

        assert_eq!(consumer.max_value(Ticker::AAPL).unwrap(), 0.0);
        assert_eq!(consumer.error_count(), 0);
    }

    #[test]
    fn subscribe_after_shutdown_reports_error() {
        let publisher = publisher(1, 4);
        publisher.shutdown();

        let consumer = Arc::new(MaxPriceConsumer::new(
            "late",
            [Ticker::AAPL].into_iter().collect(),
        ));
        publisher.subscribe(consumer.clone());

        assert_eq!(publisher.subscriber_count(), 0);
        assert!(consumer.subscription().is_none());
        assert_eq!(consumer.error_count(), 1);
    }

    #[test]
    fn second_shutdown_does_not_complete_again() {
        let publisher = publisher(1, 4);
        let consumer = Arc::new(MaxPriceConsumer::new(
            "once",
            [Ticker::AAPL].into_iter().collect(),
        ));
        publisher.subscribe(consumer.clone());

        assert!(publisher.shutdown().is_completed());
        assert!(publisher.shutdown().is_completed());
        assert!(publisher.is_shut_down());
        assert!(consumer.is_completed());
    }

    #[test]
    fn drives_through_the_publisher_trait() {
        let publisher = publisher(2, 16);
        let consumer = Arc::new(MaxPriceConsumer::new(
            "traitObject",
            [Ticker::KO].into_iter().collect(),
        ));
        let source: &dyn Publisher<PriceEvent> = &publisher;

        source.subscribe(consumer.clone());
        assert_eq!(source.publish(PriceEvent::new(Ticker::KO, 7.5)), 1);
        assert!(source.shutdown().is_completed());

        assert_eq!(consumer.max_value(Ticker::KO).unwrap(), 7.5);
        assert!(consumer.is_completed());
    }
}
