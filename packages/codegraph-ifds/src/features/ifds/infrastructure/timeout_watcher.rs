//! Wall-clock limit across a set of solvers
//!
//! The watcher polls on its own thread. Once the limit elapses it
//! force-terminates every registered solver that has not finished, with
//! [`TerminationReason::Timeout`]. Results computed so far are kept.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::termination::TerminationReason;
use crate::errors::{Result, SolverError};
use crate::features::ifds::ports::{MemoryBoundedSolver, SolverStatusListener};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchState {
    Idle,
    Running,
    Done,
}

struct StateListener {
    state: Arc<Mutex<WatchState>>,
}

impl SolverStatusListener for StateListener {
    fn on_solver_started(&self, _solver: &dyn MemoryBoundedSolver) {
        *self.state.lock() = WatchState::Running;
    }

    fn on_solver_terminated(&self, _solver: &dyn MemoryBoundedSolver) {
        *self.state.lock() = WatchState::Done;
    }
}

struct Watched {
    solver: Arc<dyn MemoryBoundedSolver>,
    state: Arc<Mutex<WatchState>>,
}

#[derive(Default)]
struct Shared {
    solvers: Mutex<Vec<Watched>>,
    stopped: AtomicBool,
    fired: AtomicBool,
}

impl Shared {
    fn all_done(&self) -> bool {
        let solvers = self.solvers.lock();
        !solvers.is_empty()
            && solvers
                .iter()
                .all(|w| *w.state.lock() == WatchState::Done && w.solver.is_terminated())
    }

    fn terminate_unfinished(&self, reason: &TerminationReason) -> usize {
        let targets: Vec<Arc<dyn MemoryBoundedSolver>> = self
            .solvers
            .lock()
            .iter()
            .filter(|w| *w.state.lock() != WatchState::Done)
            .map(|w| Arc::clone(&w.solver))
            .collect();
        for solver in &targets {
            solver.force_terminate(reason.clone());
        }
        targets.len()
    }
}

/// Force-terminates registered solvers after a timeout
pub struct TimeoutWatcher {
    timeout: Duration,
    poll_interval: Duration,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TimeoutWatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shared: Arc::new(Shared::default()),
            handle: Mutex::new(None),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Watch `solver`; its start/stop notifications drive the watcher
    pub fn add_solver(&self, solver: Arc<dyn MemoryBoundedSolver>) {
        let state = Arc::new(Mutex::new(WatchState::Idle));
        solver.add_status_listener(Arc::new(StateListener {
            state: Arc::clone(&state),
        }));
        self.shared.solvers.lock().push(Watched { solver, state });
    }

    /// Start the watcher thread
    pub fn start(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let timeout = self.timeout;
        let poll = self.poll_interval;
        shared.stopped.store(false, Ordering::Release);

        let handle = std::thread::Builder::new()
            .name("ifds-timeout-watcher".to_string())
            .spawn(move || {
                let started = Instant::now();
                debug!(timeout_secs = timeout.as_secs_f64(), "Timeout watcher started");
                while !shared.stopped.load(Ordering::Acquire) {
                    if shared.all_done() {
                        info!("All watched solvers finished, timeout watcher exiting");
                        return;
                    }
                    let elapsed = started.elapsed();
                    if elapsed > timeout {
                        shared.fired.store(true, Ordering::Release);
                        let reason = TerminationReason::Timeout {
                            elapsed,
                            limit: timeout,
                        };
                        let killed = shared.terminate_unfinished(&reason);
                        warn!(
                            elapsed_secs = elapsed.as_secs_f64(),
                            solvers = killed,
                            "Timeout reached, terminating solvers"
                        );
                        return;
                    }
                    std::thread::sleep(poll);
                }
            })
            .map_err(|e| SolverError::executor(format!("timeout watcher: {e}")))?;

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Stop watching and wait for the watcher thread
    pub fn stop(&self) {
        self.shared.stopped.store(true, Ordering::Release);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }

    /// Forget solver progress so the watcher can be started again
    pub fn reset(&self) {
        self.stop();
        for watched in self.shared.solvers.lock().iter() {
            *watched.state.lock() = WatchState::Idle;
        }
        self.shared.fired.store(false, Ordering::Release);
    }

    /// Whether the timeout fired
    pub fn fired(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }
}

impl Drop for TimeoutWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
