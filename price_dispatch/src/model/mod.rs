//! Domain state of the dispatch engine.
//!
//! - `subscription` — per-subscriber demand, cancellation and interest (`PriceSubscription`).
//! - `record` — pairing of a subscriber with its subscription (`SubscriberRecord`).
//! - `consumer` — maximum-price aggregator (`MaxPriceConsumer`).

pub mod consumer;
pub mod record;
pub mod subscription;
