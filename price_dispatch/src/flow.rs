//! Publisher / subscriber / subscription contracts of the dispatch engine.
//!
//! The three traits are independent: a `Publisher` hands each registered
//! `Subscriber` a `Subscription` during `subscribe`, the subscriber signals demand
//! through it, and the publisher delivers at most that many items.
//!
//! Callback rules:
//! - `on_subscribe` runs synchronously inside `Publisher::subscribe`, before the
//!   subscriber is visible to `publish`.
//! - `on_next` may be called concurrently from several pool workers; implementations
//!   must synchronize their own state.
//! - `on_error` receives every failure scoped to this subscriber (rejected task
//!   submission, failed delivery). It must not panic.
//! - `on_complete` is called once, at publisher shutdown.
use std::collections::HashSet;
use std::sync::Arc;

use price_common::{DispatchError, Result, Ticker};

use crate::pool::DrainStatus;

/// Source of items of type `T`.
pub trait Publisher<T> {
    /// Registers `subscriber`, handing it a fresh subscription through `on_subscribe`.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>);

    /// Fans `item` out to every registered subscriber without waiting for delivery.
    ///
    /// Returns the number of deliveries scheduled; 0 once shut down.
    fn publish(&self, item: T) -> usize;

    /// Completes every subscriber and waits, bounded, for in-flight deliveries.
    fn shutdown(&self) -> DrainStatus;
}

/// Receiver of items of type `T`.
pub trait Subscriber<T>: Send + Sync {
    /// Name used in log lines and error reports.
    fn name(&self) -> &str;

    /// Called once with the subscription created for this subscriber.
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    /// Delivers one item. An `Err` is routed back to `on_error`.
    fn on_next(&self, item: T) -> Result<()>;

    /// Reports a failure scoped to this subscriber.
    fn on_error(&self, error: DispatchError);

    /// Signals that the publisher is shutting down.
    fn on_complete(&self);
}

/// Demand, cancellation and interest state linking one subscriber to a publisher.
pub trait Subscription: Send + Sync {
    /// Authorizes `n` more deliveries.
    fn request(&self, n: u64);

    /// Stops all future deliveries. Idempotent.
    fn cancel(&self);

    /// Whether `cancel` has been called.
    fn is_cancelled(&self) -> bool;

    /// Deliveries still authorized.
    fn demand(&self) -> u64;

    /// Whether events for `item` should reach this subscriber.
    fn has_interest(&self, item: &Ticker) -> bool;

    /// Fixes the interest set. Only the first call takes effect.
    fn set_interest(&self, interest: HashSet<Ticker>);
}
