//! Price dispatch demo.
//!
//! Wires a `PricePublisher` to a set of `MaxPriceConsumer`s and drives it with a
//! synthetic random-walk feed:
//!
//! - every consumer subscribes and receives its initial demand of one event;
//! - each tick re-requests one event per consumer, then publishes one price per
//!   configured ticker;
//! - after the last tick the publisher waits for idle, shuts down, and the maxima
//!   of every consumer are printed as JSON.
//!
//! Without `--consumer`/`--ticker` flags it runs the technology / staples /
//! everything scenario over AAPL, MSFT, GOOGL, KO and PG.
//!
//! ```bash
//! price_dispatch --consumer tech=AAPL,MSFT --ticker aapl --ticker msft --ticks 20
//! ```
#![warn(missing_docs)]
mod args;

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use price_common::{Result, Ticker};
use price_dispatch::config::PublisherConfig;
use price_dispatch::flow::{Publisher, Subscriber};
use price_dispatch::generator::PriceGenerator;
use price_dispatch::model::consumer::MaxPriceConsumer;
use price_dispatch::publisher::PricePublisher;

use crate::args::{Args, ConsumerSpec};

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let config = build_config(&args)?;
    let drain_timeout = config.drain_timeout();
    let publisher = PricePublisher::new(config)?;

    let specs = if args.consumers.is_empty() {
        default_consumers()
    } else {
        args.consumers.clone()
    };
    let tickers = if args.tickers.is_empty() {
        vec![Ticker::AAPL, Ticker::MSFT, Ticker::GOOGL, Ticker::KO, Ticker::PG]
    } else {
        args.tickers.clone()
    };

    let consumers: Vec<Arc<MaxPriceConsumer>> = specs
        .iter()
        .map(|spec| Arc::new(MaxPriceConsumer::new(&spec.name, spec.interest.clone())))
        .collect();
    for consumer in &consumers {
        publisher.subscribe(consumer.clone());
    }

    let mut generator = PriceGenerator::new(tickers, args.start_price);
    for tick in 0..args.ticks {
        if tick > 0 {
            for consumer in &consumers {
                consumer.request(1);
            }
        }
        for event in generator.tick() {
            publisher.publish(event);
        }
    }

    if !publisher.wait_idle(drain_timeout).is_completed() {
        warn!("Dispatch tasks still running before shutdown");
    }
    let status = publisher.shutdown();
    info!("Shutdown status: {:?}", status);

    let report: BTreeMap<String, BTreeMap<String, f64>> = consumers
        .iter()
        .map(|consumer| (consumer.name().to_string(), consumer.snapshot()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);

    status.into_result()
}

fn build_config(args: &Args) -> Result<PublisherConfig> {
    let mut config = match &args.config {
        Some(path) => PublisherConfig::from_json_file(path)?,
        None => PublisherConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(queue_capacity) = args.queue_capacity {
        config.queue_capacity = queue_capacity;
    }
    if let Some(drain_timeout_ms) = args.drain_timeout_ms {
        config.drain_timeout_ms = drain_timeout_ms;
    }
    config.validate()?;
    info!("Publisher config: {:?}", config);
    Ok(config)
}

fn default_consumers() -> Vec<ConsumerSpec> {
    let technology = [Ticker::AAPL, Ticker::MSFT, Ticker::GOOGL];
    let staples = [Ticker::KO, Ticker::PG];
    vec![
        ConsumerSpec {
            name: "technology consumer".to_string(),
            interest: technology.into_iter().collect(),
        },
        ConsumerSpec {
            name: "staples consumer".to_string(),
            interest: staples.into_iter().collect(),
        },
        ConsumerSpec {
            name: "everything consumer".to_string(),
            interest: technology.into_iter().chain(staples).collect(),
        },
    ]
}

fn init_logger() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
