//! Maximum-price aggregator.
//!
//! `MaxPriceConsumer` is a `Subscriber<PriceEvent>` with a fixed interest set. For
//! every monitored ticker it keeps the largest price delivered so far, starting at
//! `0.0`. The map of tickers is built once in `new` and never gains or loses keys;
//! each value is an `f64` stored as bits in an `AtomicU64` and raised with a
//! compare-and-set loop, so concurrent deliveries for the same ticker never lose an
//! update.
//!
//! Demand policy: `on_subscribe` requests a single event. The consumer never
//! re-requests on its own; callers drive further flow with `request`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use log::{debug, error, info, warn};
use price_common::{DispatchError, PriceEvent, Result, Ticker};

use crate::flow::{Subscriber, Subscription};

/// Subscriber that records the maximum price seen for each monitored ticker.
pub struct MaxPriceConsumer {
    name: String,
    interest: HashSet<Ticker>,
    max_by_item: HashMap<Ticker, AtomicU64>,
    subscription: OnceLock<Arc<dyn Subscription>>,
    completed: AtomicBool,
    errors: AtomicUsize,
}

impl MaxPriceConsumer {
    /// Create a consumer monitoring `interest`, with every maximum at `0.0`.
    pub fn new(name: &str, interest: HashSet<Ticker>) -> Self {
        let max_by_item = interest
            .iter()
            .map(|ticker| (*ticker, AtomicU64::new(0f64.to_bits())))
            .collect();

        info!(
            "Initialized consumer {} with {} tickers",
            name,
            interest.len()
        );

        Self {
            name: name.to_string(),
            interest,
            max_by_item,
            subscription: OnceLock::new(),
            completed: AtomicBool::new(false),
            errors: AtomicUsize::new(0),
        }
    }

    /// Current maximum for `item`.
    ///
    /// Fails with `InvalidArgument` when `item` is not monitored.
    pub fn max_value(&self, item: Ticker) -> Result<f64> {
        match self.max_by_item.get(&item) {
            Some(cell) => Ok(f64::from_bits(cell.load(Ordering::Acquire))),
            None => {
                error!("Ticker {} not monitored by {}", item, self.name);
                Err(self.not_monitored(item))
            }
        }
    }

    /// All maxima keyed by ticker symbol, sorted for stable output.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.max_by_item
            .iter()
            .map(|(ticker, cell)| {
                (
                    ticker.to_string(),
                    f64::from_bits(cell.load(Ordering::Acquire)),
                )
            })
            .collect()
    }

    /// Authorize `n` more deliveries. Returns `false` if not subscribed yet.
    pub fn request(&self, n: u64) -> bool {
        match self.subscription.get() {
            Some(subscription) => {
                subscription.request(n);
                true
            }
            None => {
                warn!("{}: request({}) before subscription", self.name, n);
                false
            }
        }
    }

    /// Subscription received in `on_subscribe`, if any.
    pub fn subscription(&self) -> Option<Arc<dyn Subscription>> {
        self.subscription.get().cloned()
    }

    /// Whether `on_complete` has been called.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Number of errors reported through `on_error`.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Acquire)
    }

    fn not_monitored(&self, item: Ticker) -> DispatchError {
        DispatchError::InvalidArgument {
            item,
            consumer: self.name.clone(),
        }
    }
}

impl Subscriber<PriceEvent> for MaxPriceConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        if self.subscription.set(Arc::clone(&subscription)).is_err() {
            warn!("{}: already subscribed, ignoring second subscription", self.name);
            return;
        }
        subscription.set_interest(self.interest.clone());
        subscription.request(1);
    }

    fn on_next(&self, event: PriceEvent) -> Result<()> {
        let Some(cell) = self.max_by_item.get(&event.item) else {
            error!(
                "{}: received {} which it does not monitor",
                self.name, event.item
            );
            return Err(self.not_monitored(event.item));
        };

        let raised = cell.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
            (event.price > f64::from_bits(bits)).then_some(event.price.to_bits())
        });
        if raised.is_ok() {
            info!(
                "{}: Updated max price for {} to {}",
                self.name, event.item, event.price
            );
        } else {
            debug!(
                "{}: {} at {} is not a new max",
                self.name, event.item, event.price
            );
        }
        Ok(())
    }

    fn on_error(&self, error: DispatchError) {
        self.errors.fetch_add(1, Ordering::AcqRel);
        error!("{}: error occurred: {}", self.name, error);
    }

    fn on_complete(&self) {
        if !self.completed.swap(true, Ordering::AcqRel) {
            info!("Consumer {} completed", self.name);
        }
    }
}
