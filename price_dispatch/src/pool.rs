//! Bounded worker pool executing dispatch tasks.
//!
//! A fixed set of named threads pull boxed jobs from a bounded `crossbeam_channel`.
//! Submission never blocks: `try_send` either enqueues the job or fails immediately
//! with `SubmissionFailure` (queue full, or pool already shut down), leaving the
//! caller to decide whom to report it to.
//!
//! Shutdown drops the only `Sender`, which lets workers finish whatever is still
//! queued and then exit. Each worker announces its exit on a side channel, so the
//! shutting-down thread can wait with a deadline and join exactly the workers that
//! finished in time.
//!
//! A pending-task counter guarded by a `Mutex`/`Condvar` pair tracks jobs that have
//! been accepted but not finished; `wait_idle` blocks on it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use log::{debug, error, info, warn};
use price_common::{DispatchError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of waiting for in-flight tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Every accepted task finished before the deadline.
    Completed,
    /// The deadline passed with `pending` tasks still queued or running.
    TimedOut {
        /// Tasks not yet finished when the wait gave up.
        pending: usize,
    },
}

impl DrainStatus {
    /// Whether the drain finished in time.
    pub fn is_completed(&self) -> bool {
        matches!(self, DrainStatus::Completed)
    }

    /// Turn a timeout into `DispatchError::DrainTimeout` for callers that treat it as fatal.
    pub fn into_result(self) -> Result<()> {
        match self {
            DrainStatus::Completed => Ok(()),
            DrainStatus::TimedOut { pending } => Err(DispatchError::DrainTimeout { pending }),
        }
    }
}

/// Count of accepted-but-unfinished jobs.
#[derive(Default)]
struct PendingTasks {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingTasks {
    fn start(&self) {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn get(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_idle(&self, timeout: Duration) -> DrainStatus {
        let count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        let (count, _) = self
            .idle
            .wait_timeout_while(count, timeout, |pending| *pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
        match *count {
            0 => DrainStatus::Completed,
            pending => DrainStatus::TimedOut { pending },
        }
    }
}

/// Fixed-size thread pool with a bounded submission queue.
pub struct WorkerPool {
    sender: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<Option<JoinHandle<()>>>>,
    exited_rx: Receiver<usize>,
    pending: Arc<PendingTasks>,
    capacity: usize,
}

impl WorkerPool {
    /// Spawn `size` workers sharing a queue of `capacity` jobs.
    pub fn new(size: usize, capacity: usize) -> Result<Self> {
        if size == 0 || capacity == 0 {
            return Err(DispatchError::Format(format!(
                "worker pool needs at least one worker and one queue slot (got {} workers, capacity {})",
                size, capacity
            )));
        }

        let (job_tx, job_rx) = bounded::<Job>(capacity);
        let (exited_tx, exited_rx) = unbounded::<usize>();
        let pending = Arc::new(PendingTasks::default());

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let job_rx = job_rx.clone();
            let exited_tx = exited_tx.clone();
            let pending = Arc::clone(&pending);
            let handle = thread::Builder::new()
                .name(format!("dispatch-worker-{}", id))
                .spawn(move || run_worker(id, job_rx, exited_tx, pending))?;
            workers.push(Some(handle));
        }
        info!(
            "Worker pool started with {} workers, queue capacity {}",
            size, capacity
        );

        Ok(Self {
            sender: RwLock::new(Some(job_tx)),
            workers: Mutex::new(workers),
            exited_rx,
            pending,
            capacity,
        })
    }

    /// Enqueue `job` without blocking.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            return Err(DispatchError::SubmissionFailure(
                "worker pool is shut down".to_string(),
            ));
        };

        self.pending.start();
        match sender.try_send(Box::new(job)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.pending.finish();
                Err(DispatchError::SubmissionFailure(format!(
                    "queue is full ({} tasks)",
                    self.capacity
                )))
            }
            Err(TrySendError::Disconnected(_)) => {
                self.pending.finish();
                Err(DispatchError::SubmissionFailure(
                    "all workers have exited".to_string(),
                ))
            }
        }
    }

    /// Tasks accepted but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Block until every accepted task has finished, or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> DrainStatus {
        self.pending.wait_idle(timeout)
    }

    /// Stop accepting jobs and wait up to `timeout` for the queue to drain.
    ///
    /// Workers still busy at the deadline are left detached.
    pub fn shutdown(&self, timeout: Duration) -> DrainStatus {
        let deadline = Instant::now() + timeout;
        let sender = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            debug!("Worker pool already shut down");
        }
        drop(sender);

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut running = workers.iter().filter(|w| w.is_some()).count();
        while running > 0 {
            match self.exited_rx.recv_deadline(deadline) {
                Ok(id) => {
                    if let Some(handle) = workers.get_mut(id).and_then(Option::take) {
                        if handle.join().is_err() {
                            error!("Worker {} terminated abnormally", id);
                        }
                        running -= 1;
                    }
                }
                Err(_) => break,
            }
        }

        if running == 0 {
            info!("Worker pool drained");
            return match self.pending.get() {
                0 => DrainStatus::Completed,
                pending => DrainStatus::TimedOut { pending },
            };
        }

        let pending = self.pending.get().max(1);
        warn!(
            "Worker pool drain timed out: {} worker(s) busy, {} task(s) pending",
            running, pending
        );
        workers.iter_mut().for_each(|w| drop(w.take()));
        DrainStatus::TimedOut { pending }
    }
}

fn run_worker(
    id: usize,
    job_rx: Receiver<Job>,
    exited_tx: Sender<usize>,
    pending: Arc<PendingTasks>,
) {
    debug!("Worker {} started", id);
    for job in job_rx.iter() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("Worker {}: task panicked", id);
        }
        pending.finish();
    }
    debug!("Worker {} stopping", id);
    let _ = exited_tx.send(id);
}
