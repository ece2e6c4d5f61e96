//! Interruptable executor over a named Rayon pool
//!
//! Work is grouped into batches. Each batch counts its pending tasks so the
//! driving thread can block until the batch drains. `interrupt` makes queued
//! tasks of the current batch return without running and `reset` opens a
//! fresh batch, so stale tasks of an interrupted batch never do work.

use parking_lot::{Condvar, Mutex, RwLock};
use rayon::ThreadPool;
use std::any::Any;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::{Result, SolverError};
use crate::shared::build_pool;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Order in which queued tasks are started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOrder {
    /// Submission order (Rayon's own queues)
    Fifo,
    /// Lowest priority value first, ties in submission order
    ShortestFirst,
}

struct PrioritizedTask {
    priority: usize,
    seq: u64,
    task: Task,
}

impl PartialEq for PrioritizedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for PrioritizedTask {}

impl PartialOrd for PrioritizedTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrioritizedTask {
    // BinaryHeap is a max-heap: invert so the smallest priority pops first
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Batch {
    pending: AtomicUsize,
    interrupted: AtomicBool,
    lock: Mutex<()>,
    drained: Condvar,
    failure: Mutex<Option<String>>,
    queue: Mutex<BinaryHeap<PrioritizedTask>>,
    seq: AtomicU64,
}

impl Batch {
    fn new() -> Self {
        Self {
            pending: AtomicUsize::new(0),
            interrupted: AtomicBool::new(false),
            lock: Mutex::new(()),
            drained: Condvar::new(),
            failure: Mutex::new(None),
            queue: Mutex::new(BinaryHeap::new()),
            seq: AtomicU64::new(0),
        }
    }

    fn run(&self, task: Task) {
        if !self.interrupted.load(Ordering::Acquire) {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                let msg = panic_message(payload.as_ref());
                warn!(error = %msg, "Worker task panicked, interrupting batch");
                let mut failure = self.failure.lock();
                if failure.is_none() {
                    *failure = Some(msg);
                }
                drop(failure);
                self.interrupted.store(true, Ordering::Release);
            }
        }
        self.finish();
    }

    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = self.lock.lock();
            self.drained.notify_all();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Thread pool whose current batch can be awaited, interrupted and replaced
pub struct InterruptableExecutor {
    name: &'static str,
    pool: ThreadPool,
    order: QueueOrder,
    batch: RwLock<Arc<Batch>>,
    shut_down: AtomicBool,
}

impl InterruptableExecutor {
    pub fn new(name: &'static str, threads: usize, order: QueueOrder) -> Result<Self> {
        let pool = build_pool(name, threads)?;
        debug!(
            executor = name,
            threads = pool.current_num_threads(),
            ?order,
            "Executor created"
        );
        Ok(Self {
            name,
            pool,
            order,
            batch: RwLock::new(Arc::new(Batch::new())),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn current(&self) -> Arc<Batch> {
        Arc::clone(&self.batch.read())
    }

    /// Queue `task`; false if the executor is shut down or interrupted
    pub fn execute<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute_prioritized(0, task)
    }

    /// Queue `task` with a priority (lower runs first under `ShortestFirst`)
    pub fn execute_prioritized<F>(&self, priority: usize, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let batch = self.current();
        if self.shut_down.load(Ordering::Acquire) || batch.interrupted.load(Ordering::Acquire) {
            return false;
        }
        batch.pending.fetch_add(1, Ordering::AcqRel);
        match self.order {
            QueueOrder::Fifo => {
                self.pool.spawn(move || batch.run(Box::new(task)));
            }
            QueueOrder::ShortestFirst => {
                let seq = batch.seq.fetch_add(1, Ordering::Relaxed);
                batch.queue.lock().push(PrioritizedTask {
                    priority,
                    seq,
                    task: Box::new(task),
                });
                // one pool job per queued task; each pops the best task available
                self.pool.spawn(move || {
                    let next = batch.queue.lock().pop();
                    match next {
                        Some(entry) => batch.run(entry.task),
                        None => batch.finish(),
                    }
                });
            }
        }
        true
    }

    /// Block until every task of the current batch has returned
    ///
    /// Returns `SolverError::WorkerPanicked` if a task panicked.
    pub fn await_completion(&self) -> Result<()> {
        let batch = self.current();
        {
            let mut guard = batch.lock.lock();
            while batch.pending.load(Ordering::Acquire) > 0 {
                batch.drained.wait(&mut guard);
            }
        }
        Self::check_failure(&batch)
    }

    /// Like [`await_completion`](Self::await_completion) but gives up after
    /// `timeout`; `Ok(false)` means tasks were still running
    pub fn await_completion_timeout(&self, timeout: Duration) -> Result<bool> {
        let batch = self.current();
        let deadline = Instant::now() + timeout;
        let drained = {
            let mut guard = batch.lock.lock();
            loop {
                if batch.pending.load(Ordering::Acquire) == 0 {
                    break true;
                }
                if batch.drained.wait_until(&mut guard, deadline).timed_out() {
                    break batch.pending.load(Ordering::Acquire) == 0;
                }
            }
        };
        Self::check_failure(&batch)?;
        Ok(drained)
    }

    fn check_failure(batch: &Batch) -> Result<()> {
        match batch.failure.lock().take() {
            Some(msg) => Err(SolverError::worker_panicked(msg)),
            None => Ok(()),
        }
    }

    /// Queued tasks of the current batch return without running
    pub fn interrupt(&self) {
        self.current().interrupted.store(true, Ordering::Release);
    }

    /// Reject further submissions until the next `reset`
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    /// Open a new batch and accept submissions again
    pub fn reset(&self) {
        let old = {
            let mut slot = self.batch.write();
            std::mem::replace(&mut *slot, Arc::new(Batch::new()))
        };
        old.interrupted.store(true, Ordering::Release);
        self.shut_down.store(false, Ordering::Release);
    }

    /// No task of the current batch is pending
    pub fn is_finished(&self) -> bool {
        self.current().pending.load(Ordering::Acquire) == 0
    }

    /// Shut down and drained
    pub fn is_terminated(&self) -> bool {
        self.shut_down.load(Ordering::Acquire) && self.is_finished()
    }

    pub fn is_interrupted(&self) -> bool {
        self.current().interrupted.load(Ordering::Acquire)
    }

    /// Panic message captured in the current batch, if any
    pub fn take_failure(&self) -> Option<String> {
        self.current().failure.lock().take()
    }
}
