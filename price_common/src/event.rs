//! Price update published through the dispatch engine.
//!
//! A `PriceEvent` is created once per published update, fanned out by value to
//! every subscriber, and discarded afterwards. It carries no identity beyond its
//! two fields.
use serde::{Deserialize, Serialize};

use crate::tickers::Ticker;

/// One price observation for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceEvent {
    /// Item the price refers to.
    pub item: Ticker,
    /// Observed price.
    pub price: f64,
}

impl PriceEvent {
    /// Creates a new price event.
    pub fn new(item: Ticker, price: f64) -> Self {
        PriceEvent { item, price }
    }
}
