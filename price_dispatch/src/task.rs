//! Unit of asynchronous delivery: one event for one subscriber.
//!
//! A `DispatchTask` decides on its own whether its subscriber should see the event
//! and performs at most one delivery. The checks run in this order:
//!
//! 1. cancelled subscription → dropped;
//! 2. item outside the interest set → dropped (no demand consumed);
//! 3. no demand left → dropped;
//! 4. otherwise one unit of demand is taken atomically and `on_next` is called.
//!
//! Dropped events are not errors. A delivery that returns `Err` or panics gives
//! its unit of demand back and is reported to the same subscriber's `on_error`;
//! it goes no further.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, warn};
use price_common::{DispatchError, PriceEvent};

use crate::flow::Subscription;
use crate::model::record::SubscriberRecord;

/// What a dispatch task did with its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// `on_next` was called and succeeded.
    Delivered,
    /// The subscription is cancelled.
    Cancelled,
    /// The subscriber does not monitor the event's item.
    NotInterested,
    /// The subscriber has no outstanding demand.
    NoDemand,
    /// `on_next` failed; the failure went to `on_error`.
    Failed,
}

/// Delivers one event to one subscriber if it is eligible.
pub struct DispatchTask {
    record: Arc<SubscriberRecord>,
    event: PriceEvent,
}

impl DispatchTask {
    /// Create a task delivering `event` to the subscriber in `record`.
    pub fn new(record: Arc<SubscriberRecord>, event: PriceEvent) -> Self {
        debug!(
            "Constructing dispatch task for {:?} -> {}",
            event,
            record.name()
        );
        Self { record, event }
    }

    /// Evaluate eligibility and deliver at most once.
    pub fn run(self) -> Dispatch {
        let subscription = &self.record.subscription;
        let name = self.record.name();

        let outcome = if subscription.is_cancelled() {
            Dispatch::Cancelled
        } else if !subscription.has_interest(&self.event.item) {
            Dispatch::NotInterested
        } else if !subscription.try_acquire() {
            Dispatch::NoDemand
        } else {
            self.deliver()
        };

        debug!(
            "Dispatch of {} for {}: {:?}",
            self.event.item, name, outcome
        );
        outcome
    }

    fn deliver(&self) -> Dispatch {
        let subscriber = &self.record.subscriber;
        let result = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_next(self.event)));

        let reason = match result {
            Ok(Ok(())) => return Dispatch::Delivered,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        warn!("Delivery to {} failed: {}", subscriber.name(), reason);
        self.record.subscription.release();
        subscriber.on_error(DispatchError::DeliveryFailure {
            subscriber: subscriber.name().to_string(),
            reason,
        });
        Dispatch::Failed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
