//!
//! Common types shared by the price dispatch engine and its subscribers.
//!
//! This crate aggregates:
//! - `error` — unified error type `DispatchError` used across the workspace.
//! - `result` — handy `Result<T, DispatchError>` alias.
//! - `tickers` — the catalog of ticker symbols used as item identifiers.
//! - `event` — the immutable `PriceEvent` published to subscribers.
//! - `defaults` — default tunables for the worker pool and shutdown drain.
#![warn(missing_docs)]
pub mod defaults;
pub mod error;
pub mod event;
pub mod result;
pub mod tickers;

pub use error::DispatchError;
pub use event::PriceEvent;
pub use result::Result;
pub use tickers::Ticker;
