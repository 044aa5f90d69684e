//! In-process price dispatch engine with pull-based backpressure.
//!
//! A `PricePublisher` fans every published `PriceEvent` out to its registered
//! subscribers as independent dispatch tasks on a bounded worker pool. Each task
//! delivers only if the subscriber's subscription is active, interested in the
//! event's ticker, and still holds demand; demand is granted by the subscriber
//! through `Subscription::request`.
//!
//! Modules:
//! - `flow` — `Publisher`, `Subscriber` and `Subscription` traits.
//! - `model` — `PriceSubscription`, `SubscriberRecord` and the `MaxPriceConsumer` aggregator.
//! - `task` — `DispatchTask`, the per-subscriber delivery decision.
//! - `pool` — bounded `WorkerPool` and the `DrainStatus` of a shutdown.
//! - `publisher` — `PricePublisher`, registry and fan-out.
//! - `config` — `PublisherConfig` defaults and JSON loading.
//! - `generator` — random-walk price feed used by the demo binary.
#![warn(missing_docs)]
pub mod config;
pub mod flow;
pub mod generator;
pub mod model;
pub mod pool;
pub mod publisher;
pub mod task;

pub use config::PublisherConfig;
pub use flow::{Publisher, Subscriber, Subscription};
pub use model::consumer::MaxPriceConsumer;
pub use model::subscription::PriceSubscription;
pub use pool::DrainStatus;
pub use publisher::PricePublisher;
