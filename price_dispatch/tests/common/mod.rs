//! Test subscribers shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crossbeam_channel::{Receiver, Sender};
use price_common::{DispatchError, PriceEvent, Result, Ticker};
use price_dispatch::{Subscriber, Subscription};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn tickers(list: &[Ticker]) -> HashSet<Ticker> {
    list.iter().copied().collect()
}

/// Records every callback; optionally fails or blocks inside `on_next`.
pub struct Recorder {
    name: String,
    interest: HashSet<Ticker>,
    initial_demand: u64,
    fail: bool,
    gate: Option<(Sender<()>, Receiver<()>)>,
    subscribe_gate: Option<(Sender<()>, Receiver<()>)>,
    subscription: OnceLock<Arc<dyn Subscription>>,
    pub delivered: Mutex<Vec<PriceEvent>>,
    pub errors: Mutex<Vec<DispatchError>>,
    pub completions: AtomicUsize,
}

impl Recorder {
    pub fn new(name: &str, interest: &[Ticker], initial_demand: u64) -> Self {
        Self {
            name: name.to_string(),
            interest: tickers(interest),
            initial_demand,
            fail: false,
            gate: None,
            subscribe_gate: None,
            subscription: OnceLock::new(),
            delivered: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
        }
    }

    /// `on_next` always returns an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// `on_next` signals `started` and then waits for `release`.
    pub fn gated(mut self, started: Sender<()>, release: Receiver<()>) -> Self {
        self.gate = Some((started, release));
        self
    }

    /// `on_subscribe` signals `started` and then waits for `release`.
    pub fn gated_subscribe(mut self, started: Sender<()>, release: Receiver<()>) -> Self {
        self.subscribe_gate = Some((started, release));
        self
    }

    pub fn subscription(&self) -> Arc<dyn Subscription> {
        Arc::clone(self.subscription.get().expect("subscribed"))
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl Subscriber<PriceEvent> for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        subscription.set_interest(self.interest.clone());
        if self.initial_demand > 0 {
            subscription.request(self.initial_demand);
        }
        let _ = self.subscription.set(subscription);
        if let Some((started, release)) = &self.subscribe_gate {
            let _ = started.send(());
            let _ = release.recv();
        }
    }

    fn on_next(&self, event: PriceEvent) -> Result<()> {
        if let Some((started, release)) = &self.gate {
            let _ = started.send(());
            let _ = release.recv();
        }
        if self.fail {
            return Err(DispatchError::Format(format!("{} refuses {:?}", self.name, event)));
        }
        self.delivered.lock().unwrap().push(event);
        Ok(())
    }

    fn on_error(&self, error: DispatchError) {
        self.errors.lock().unwrap().push(error);
    }

    fn on_complete(&self) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}
