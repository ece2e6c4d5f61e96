//! Termination reasons and the kill flag shared by solvers and path builders

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::features::ifds::ports::{MemoryBoundedSolver, SolverStatusListener};

/// Why a run stopped before reaching its fixed point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Memory pressure reported by an external monitor
    OutOfMemory,
    /// Wall-clock limit exceeded
    Timeout { elapsed: Duration, limit: Duration },
    /// Stopped on request (a results listener, an embedder)
    Requested(String),
    /// Several reasons, e.g. from different path-builder batches
    Multiple(Vec<TerminationReason>),
}

impl TerminationReason {
    /// Merge two reasons, flattening nested `Multiple`s and dropping duplicates
    pub fn combine(self, other: TerminationReason) -> TerminationReason {
        let mut merged: Vec<TerminationReason> = Vec::new();
        for reason in [self, other] {
            match reason {
                TerminationReason::Multiple(inner) => {
                    for r in inner {
                        if !merged.contains(&r) {
                            merged.push(r);
                        }
                    }
                }
                r => {
                    if !merged.contains(&r) {
                        merged.push(r);
                    }
                }
            }
        }
        if merged.len() == 1 {
            merged.remove(0)
        } else {
            TerminationReason::Multiple(merged)
        }
    }

    /// Combine an optional accumulated reason with a new one
    pub fn merge(current: Option<TerminationReason>, next: Option<TerminationReason>) -> Option<TerminationReason> {
        match (current, next) {
            (None, None) => None,
            (Some(r), None) | (None, Some(r)) => Some(r),
            (Some(a), Some(b)) => Some(a.combine(b)),
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            TerminationReason::Timeout { .. } => true,
            TerminationReason::Multiple(inner) => inner.iter().any(|r| r.is_timeout()),
            _ => false,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::OutOfMemory => write!(f, "out of memory"),
            TerminationReason::Timeout { elapsed, limit } => {
                write!(f, "timeout after {:.1}s (limit {:.1}s)", elapsed.as_secs_f64(), limit.as_secs_f64())
            }
            TerminationReason::Requested(msg) => write!(f, "requested: {msg}"),
            TerminationReason::Multiple(reasons) => {
                write!(f, "multiple reasons: ")?;
                for (i, r) in reasons.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{r}")?;
                }
                Ok(())
            }
        }
    }
}

/// Kill flag, termination reason and status listeners of one component
#[derive(Default)]
pub struct TerminationState {
    killed: AtomicBool,
    reason: Mutex<Option<TerminationReason>>,
    listeners: Mutex<Vec<Arc<dyn SolverStatusListener>>>,
}

impl TerminationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the kill flag; the first reason wins. Returns true on the first kill.
    pub fn kill(&self, reason: TerminationReason) -> bool {
        let mut slot = self.reason.lock();
        if slot.is_none() {
            *slot = Some(reason);
        }
        !self.killed.swap(true, Ordering::AcqRel)
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.reason.lock().clone()
    }

    /// Clear the kill flag and reason
    pub fn reset(&self) {
        let mut slot = self.reason.lock();
        *slot = None;
        self.killed.store(false, Ordering::Release);
    }

    pub fn add_listener(&self, listener: Arc<dyn SolverStatusListener>) {
        self.listeners.lock().push(listener);
    }

    pub fn notify_started(&self, solver: &dyn MemoryBoundedSolver) {
        for listener in self.listeners_snapshot() {
            listener.on_solver_started(solver);
        }
    }

    pub fn notify_terminated(&self, solver: &dyn MemoryBoundedSolver) {
        for listener in self.listeners_snapshot() {
            listener.on_solver_terminated(solver);
        }
    }

    fn listeners_snapshot(&self) -> Vec<Arc<dyn SolverStatusListener>> {
        self.listeners.lock().clone()
    }
}
