//! Worker pool sizing and construction

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::errors::{Result, SolverError};

/// Resolve a configured thread count (0 = 75% of cores, at least 1)
pub fn worker_threads(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    let num_cpus = num_cpus::get();
    std::cmp::max(1, (num_cpus * 3) / 4)
}

/// Build a named Rayon pool for solver or path builder tasks
pub fn build_pool(name: &'static str, requested: usize) -> Result<ThreadPool> {
    let threads = worker_threads(requested);
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("{name}-{i}"))
        .build()
        .map_err(|e| SolverError::executor(format!("{name} pool: {e}")))
}
