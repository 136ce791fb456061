//! Bounded worker pool for request execution.
//!
//! The RPC layer hands request bodies over as opaque closures; a fixed set
//! of worker threads drains them from a capacity-capped FIFO queue. A full
//! queue rejects the submitter immediately rather than blocking it, and a
//! panicking task is logged without taking its worker down.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Default cap on queued-but-unstarted tasks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Error type for task submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("task queue full")]
    QueueFull,

    #[error("worker pool stopped")]
    Stopped,
}

struct QueueState {
    tasks: VecDeque<Task>,
    stopped: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    task_ready: Condvar,
    capacity: usize,
}

/// Fixed-size thread pool over a bounded FIFO queue.
///
/// Shutdown is idempotent and also runs on drop: the stop flag is set, all
/// waiters are woken, and every worker is joined. In-flight tasks finish
/// naturally; tasks still queued are dropped.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `num_workers` workers with the default queue capacity.
    pub fn new(num_workers: usize) -> Self {
        Self::with_capacity(num_workers, DEFAULT_QUEUE_CAPACITY)
    }

    /// Spawn `num_workers` workers over a queue capped at `capacity`.
    pub fn with_capacity(num_workers: usize, capacity: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                stopped: false,
            }),
            task_ready: Condvar::new(),
            capacity,
        });

        tracing::info!(workers = num_workers, capacity, "starting worker pool");
        let workers = (0..num_workers)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || Self::worker_loop(shared))
            })
            .collect();

        Self {
            shared,
            workers: Mutex::new(workers),
        }
    }

    /// Queue a task for execution. Never blocks.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> Result<(), ExecutorError> {
        {
            let mut state = self.shared.state.lock();
            if state.stopped {
                return Err(ExecutorError::Stopped);
            }
            if state.tasks.len() >= self.shared.capacity {
                return Err(ExecutorError::QueueFull);
            }
            state.tasks.push_back(Box::new(task));
        }
        self.shared.task_ready.notify_one();
        Ok(())
    }

    /// Stop the pool: refuse new submissions, wake every worker, join them.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
        }
        self.shared.task_ready.notify_all();

        let mut workers = self.workers.lock();
        for worker in workers.drain(..) {
            let _ = worker.join();
        }
        tracing::info!("worker pool stopped");
    }

    fn worker_loop(shared: Arc<Shared>) {
        loop {
            let task = {
                let mut state = shared.state.lock();
                loop {
                    if state.stopped {
                        return;
                    }
                    if let Some(task) = state.tasks.pop_front() {
                        break task;
                    }
                    shared.task_ready.wait(&mut state);
                }
            };

            if let Err(panic) = catch_unwind(AssertUnwindSafe(task)) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(error = %message, "worker task panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
