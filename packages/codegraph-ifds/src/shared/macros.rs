//! Shared macros for the codebase
//!
//! Per-edge tracing is far too chatty for normal runs, so it compiles to
//! nothing unless the `trace` feature is enabled.

/// Trace a single propagated edge - no-op when trace feature is disabled
#[cfg(not(feature = "trace"))]
#[macro_export]
macro_rules! trace_edge {
    ($($arg:tt)*) => {};
}

/// Trace a single propagated edge
#[cfg(feature = "trace")]
#[macro_export]
macro_rules! trace_edge {
    ($($arg:tt)*) => {
        tracing::trace!(target: "codegraph_ifds::edges", $($arg)*)
    };
}
