//! Fixed-size worker pool over a shared blocking queue.
//!
//! The pool owns `worker_count` long-lived OS threads that pull boxed
//! closures off a single channel. It is a generic concurrency primitive:
//! nothing in this crate knows about images or histograms.
//!
//! ## Contract
//!
//! - [`WorkerPool::submit`] enqueues a unit for asynchronous execution.
//!   Units may run in any order and on any worker, but each submitted
//!   unit runs exactly once.
//! - [`WorkerPool::shutdown`] consumes the pool, stops accepting new
//!   units (enforced by the type system), and blocks until every
//!   already-submitted unit has finished.
//! - A panicking unit never takes its worker down: the panic is caught,
//!   reported to the pool's [`FailureObserver`], and the worker keeps
//!   pulling subsequent units.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use thiserror::Error;

/// A unit of work executed by one pool worker.
pub type WorkUnit = Box<dyn FnOnce() + Send + 'static>;

/// Errors produced by pool construction and submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was built with a non-positive worker count.
    #[error("worker count must be at least 1, got {count}")]
    InvalidWorkerCount { count: usize },

    /// The work queue is gone; no worker can ever receive this unit.
    #[error("work queue disconnected; unit was not enqueued")]
    QueueDisconnected,
}

/// Receives failures from units that panicked inside a worker.
///
/// Observers must be cheap and must not panic themselves; they run on
/// the worker thread between units.
pub trait FailureObserver: Send + Sync {
    fn on_unit_failure(&self, worker: usize, message: &str);
}

/// Default observer: reports failed units through `tracing`.
pub struct TracingObserver;

impl FailureObserver for TracingObserver {
    fn on_unit_failure(&self, worker: usize, message: &str) {
        tracing::error!(worker, message, "work unit panicked");
    }
}

/// A fixed set of persistent worker threads consuming a shared queue.
pub struct WorkerPool {
    sender: Option<Sender<WorkUnit>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Build a pool of `worker_count` threads reporting failures via
    /// [`TracingObserver`].
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        Self::with_observer(worker_count, Arc::new(TracingObserver))
    }

    /// Build a pool with a caller-supplied failure observer.
    pub fn with_observer(
        worker_count: usize,
        observer: Arc<dyn FailureObserver>,
    ) -> Result<Self, PoolError> {
        if worker_count == 0 {
            return Err(PoolError::InvalidWorkerCount {
                count: worker_count,
            });
        }

        let (sender, receiver) = channel::<WorkUnit>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count)
            .map(|id| {
                let receiver = Arc::clone(&receiver);
                let observer = Arc::clone(&observer);
                thread::spawn(move || worker_loop(id, receiver, observer))
            })
            .collect();

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Enqueue one unit of work for asynchronous execution.
    pub fn submit<F>(&self, unit: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolError::QueueDisconnected)?;
        sender
            .send(Box::new(unit))
            .map_err(|_| PoolError::QueueDisconnected)
    }

    /// Stop accepting units and block until every submitted unit has run.
    pub fn shutdown(mut self) {
        self.join_workers();
    }

    fn join_workers(&mut self) {
        // Dropping the sender closes the queue; workers drain the
        // remaining units and exit their receive loop.
        drop(self.sender.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread terminated abnormally");
            }
        }
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}

fn worker_loop(id: usize, receiver: Arc<Mutex<Receiver<WorkUnit>>>, observer: Arc<dyn FailureObserver>) {
    loop {
        let unit = {
            let guard = receiver
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.recv()
        };
        match unit {
            Ok(unit) => {
                if let Err(panic) = catch_unwind(AssertUnwindSafe(unit)) {
                    // as_ref unwraps the Box; passing `&panic` would
                    // coerce the Box itself into `dyn Any` and the
                    // downcasts below would never match.
                    observer.on_unit_failure(id, &panic_message(panic.as_ref()));
                }
            }
            // Sender dropped: queue is drained and closed.
            Err(_) => break,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
