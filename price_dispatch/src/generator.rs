//! Synthetic price feed for the demo binary.
//!
//! `PriceGenerator` keeps the last price of each ticker and moves it by a small
//! random walk: every step changes the price by a uniform amount in `[-1%, +1%]`,
//! floored at `0.01` so prices stay positive.

use std::collections::HashMap;

use price_common::{PriceEvent, Ticker};
use rand::Rng;

/// Smallest price the random walk may produce.
pub const MIN_PRICE: f64 = 0.01;

/// Random-walk price source over a fixed list of tickers.
pub struct PriceGenerator {
    tickers: Vec<Ticker>,
    current_prices: HashMap<Ticker, f64>,
}

impl PriceGenerator {
    /// Start every ticker at `initial_price`.
    pub fn new(tickers: Vec<Ticker>, initial_price: f64) -> Self {
        let start = initial_price.max(MIN_PRICE);
        let current_prices = tickers.iter().map(|t| (*t, start)).collect();
        Self {
            tickers,
            current_prices,
        }
    }

    /// Next synthetic price around `current_price`.
    pub fn next_price(current_price: f64) -> f64 {
        let mut rng = rand::rng();
        let change: f64 = rng.random_range(-0.01..0.01);
        let new_price = current_price * (1.0 + change);
        new_price.max(MIN_PRICE)
    }

    /// Advance every ticker one step and return the resulting events.
    pub fn tick(&mut self) -> Vec<PriceEvent> {
        let mut events = Vec::with_capacity(self.tickers.len());
        for ticker in &self.tickers {
            let price = self
                .current_prices
                .entry(*ticker)
                .or_insert(MIN_PRICE);
            *price = Self::next_price(*price);
            events.push(PriceEvent::new(*ticker, *price));
        }
        events
    }
}
