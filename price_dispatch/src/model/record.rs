//! Registry entry pairing one subscriber with its subscription.

use std::sync::Arc;

use price_common::PriceEvent;

use crate::flow::Subscriber;
use crate::model::subscription::PriceSubscription;

/// One registered subscriber and the subscription created for it.
///
/// Created by `subscribe` and kept until the publisher is dropped.
#[derive(Clone)]
pub struct SubscriberRecord {
    /// The subscriber receiving events.
    pub subscriber: Arc<dyn Subscriber<PriceEvent>>,
    /// Backpressure state shared with the subscriber.
    pub subscription: Arc<PriceSubscription>,
}

impl SubscriberRecord {
    /// Pair `subscriber` with `subscription`.
    pub fn new(
        subscriber: Arc<dyn Subscriber<PriceEvent>>,
        subscription: Arc<PriceSubscription>,
    ) -> Self {
        Self {
            subscriber,
            subscription,
        }
    }

    /// Name of the subscriber, for logging.
    pub fn name(&self) -> &str {
        self.subscriber.name()
    }
}
