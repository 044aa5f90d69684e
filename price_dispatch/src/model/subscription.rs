//! Per-subscriber backpressure state.
//!
//! A `PriceSubscription` holds the demand counter, the cancellation flag and the
//! interest set for one subscriber. The publisher keeps the concrete type so its
//! dispatch tasks can use `try_acquire`; the subscriber only sees it through the
//! `Subscription` trait.
//!
//! State machine: `Active` → `Cancelled` via `cancel()`, never back. A cancelled
//! subscription keeps its demand and interest but is ineligible for delivery.
//!
//! The interest set is fixed by the first `set_interest` call; later calls are
//! ignored.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::{debug, warn};
use price_common::Ticker;

use crate::flow::Subscription;

/// Demand counter, cancellation flag and interest set of one subscriber.
#[derive(Debug, Default)]
pub struct PriceSubscription {
    demand: AtomicU64,
    cancelled: AtomicBool,
    interest: OnceLock<HashSet<Ticker>>,
}

impl PriceSubscription {
    /// Create an active subscription with zero demand and an empty interest set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically take one unit of demand if any is left.
    ///
    /// Returns `true` when the caller now owns one delivery. This is the only way
    /// dispatch tasks consume demand, so concurrent tasks can never deliver more
    /// than was requested.
    pub fn try_acquire(&self) -> bool {
        self.demand
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| d.checked_sub(1))
            .is_ok()
    }

    /// Give back one unit taken by `try_acquire` whose delivery failed.
    pub fn release(&self) {
        let _ = self
            .demand
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| {
                Some(d.saturating_add(1))
            });
    }

    /// Decrease demand by one, stopping at zero.
    pub fn decrement_demand(&self) {
        if !self.try_acquire() {
            warn!("Demand decrement requested with no outstanding demand");
        }
    }
}

impl Subscription for PriceSubscription {
    fn request(&self, n: u64) {
        if n == 0 {
            warn!("Ignoring request for 0 items");
            return;
        }
        debug!("Requesting {} items", n);
        // Unbounded in spirit; saturate rather than wrap.
        let _ = self
            .demand
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| {
                Some(d.saturating_add(n))
            });
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("Subscription cancelled");
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn demand(&self) -> u64 {
        self.demand.load(Ordering::Acquire)
    }

    fn has_interest(&self, item: &Ticker) -> bool {
        self.interest
            .get()
            .is_some_and(|interest| interest.contains(item))
    }

    fn set_interest(&self, interest: HashSet<Ticker>) {
        if self.interest.set(interest).is_err() {
            warn!("Interest set already fixed, ignoring replacement");
        }
    }
}
