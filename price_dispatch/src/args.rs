//! Command-line arguments for the dispatch demo.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use price_common::tickers::parse_ticker_list;
use price_common::{DispatchError, Ticker};

/// A named consumer and the tickers it monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerSpec {
    /// Consumer name used in logs and in the report.
    pub name: String,
    /// Monitored tickers.
    pub interest: HashSet<Ticker>,
}

/// Parse `NAME=T1,T2,...` into a `ConsumerSpec`.
pub fn parse_consumer(raw: &str) -> Result<ConsumerSpec, DispatchError> {
    let (name, tickers) = raw.split_once('=').ok_or_else(|| {
        DispatchError::Format(format!("expected NAME=TICKER[,TICKER...], got '{}'", raw))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(DispatchError::Format(format!("consumer name missing in '{}'", raw)));
    }
    let interest = parse_ticker_list(tickers)?;
    if interest.is_empty() {
        return Err(DispatchError::Format(format!("consumer '{}' monitors no tickers", name)));
    }
    Ok(ConsumerSpec {
        name: name.to_string(),
        interest,
    })
}

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// JSON file with publisher settings (`workers`, `queue_capacity`, `drain_timeout_ms`).
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Number of dispatch workers (overrides the config file).
    #[clap(long)]
    pub workers: Option<usize>,

    /// Capacity of the dispatch queue (overrides the config file).
    #[clap(long)]
    pub queue_capacity: Option<usize>,

    /// Shutdown drain timeout in milliseconds (overrides the config file).
    #[clap(long)]
    pub drain_timeout_ms: Option<u64>,

    /// Consumer as NAME=TICKER[,TICKER...]; repeat for several consumers.
    #[clap(long = "consumer", value_parser = parse_consumer)]
    pub consumers: Vec<ConsumerSpec>,

    /// Ticker to generate prices for; repeat for several tickers.
    #[clap(long = "ticker", value_enum)]
    pub tickers: Vec<Ticker>,

    /// Number of price rounds to publish.
    #[clap(long, default_value_t = 10)]
    pub ticks: usize,

    /// Starting price of every generated ticker.
    #[clap(long, default_value_t = 100.0)]
    pub start_price: f64,
}
