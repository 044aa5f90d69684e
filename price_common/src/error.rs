//! Error types shared by the dispatch engine and its subscribers.
//!
//! The `DispatchError` enum covers the failure classes of the publish/subscribe
//! core (invalid queries, rejected task submissions, failed deliveries, drain
//! timeouts) together with the ambient I/O and configuration failures, so every
//! crate in the workspace can propagate a single error type.
use std::io;

use thiserror::Error;

use crate::tickers::Ticker;

/// Unified error type shared by publisher, dispatch tasks and consumers.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A consumer was asked about (or handed) an item outside its interest set.
    #[error("Invalid argument: {item} not monitored by {consumer}")]
    InvalidArgument {
        /// Item the caller asked about.
        item: Ticker,
        /// Name of the consumer that rejected it.
        consumer: String,
    },

    /// The worker pool refused a dispatch task (queue full or pool shut down).
    #[error("Task submission failed: {0}")]
    SubmissionFailure(String),

    /// A subscriber's `on_next` returned an error or panicked.
    #[error("Delivery to {subscriber} failed: {reason}")]
    DeliveryFailure {
        /// Name of the subscriber whose delivery failed.
        subscriber: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Shutdown gave up waiting for in-flight tasks.
    #[error("Drain timed out with {pending} task(s) still in flight")]
    DrainTimeout {
        /// Tasks that had not finished when the deadline passed.
        pending: usize,
    },

    /// I/O error originating from the standard library (config files, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while decoding or encoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
