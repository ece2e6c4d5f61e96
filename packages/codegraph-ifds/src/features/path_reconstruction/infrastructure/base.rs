//! State and driver loop shared by the concurrent path builders

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{PathConfig, Validatable};
use crate::errors::Result;
use crate::features::ifds::context::AnalysisContext;
use crate::features::ifds::domain::{AbstractionAtSink, FactArena, FactId};
use crate::features::ifds::infrastructure::executor::{InterruptableExecutor, QueueOrder};
use crate::features::ifds::infrastructure::termination::{TerminationReason, TerminationState};
use crate::features::ifds::ports::{InterproceduralCfg, MemoryBoundedSolver, SolverStatusListener};
use crate::features::path_reconstruction::domain::{
    InfoflowResults, ResultRecord, SourceContextAndPath,
};
use crate::features::path_reconstruction::ports::PathResultListener;
use crate::shared::GraphKey;

/// How long tasks may keep running after a timeout kill
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Partial paths recorded per fact
pub(crate) type PathCache<N> = DashMap<FactId, FxHashSet<Arc<SourceContextAndPath<N>>>, FxBuildHasher>;

/// Sink facts for the neighbors that cached facts gained since their walk
///
/// Updates the neighbor counter of every revisited path.
pub(crate) fn neighbor_sinks<N: GraphKey>(
    facts: &FactArena<N>,
    cache: &PathCache<N>,
) -> Vec<AbstractionAtSink<N>> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for entry in cache.iter() {
        let neighbors = facts[*entry.key()].neighbors();
        if neighbors.is_empty() {
            continue;
        }
        for scap in entry.value() {
            if scap.neighbor_counter() == neighbors.len() {
                continue;
            }
            scap.set_neighbor_counter(neighbors.len());
            for &neighbor in &neighbors {
                let sink = AbstractionAtSink::new(scap.definition().clone(), neighbor, scap.stmt().clone());
                if seen.insert(sink.clone()) {
                    out.push(sink);
                }
            }
        }
    }
    out
}

/// Executor, kill flag, result set and handlers of one builder
pub(crate) struct BuilderBase<N: GraphKey, M: GraphKey> {
    name: &'static str,
    ctx: AnalysisContext<N, M>,
    config: PathConfig,
    executor: InterruptableExecutor,
    termination: TerminationState,
    results: Arc<InfoflowResults<N>>,
    handlers: RwLock<Vec<Arc<dyn PathResultListener<N>>>>,
}

impl<N: GraphKey, M: GraphKey> BuilderBase<N, M> {
    pub(crate) fn new(
        name: &'static str,
        ctx: AnalysisContext<N, M>,
        config: PathConfig,
        order: QueueOrder,
    ) -> Result<Self> {
        config.validate().inspect_err(|e| {
            warn!(config = config.config_name(), error = %e, "Rejected configuration");
        })?;
        let executor = InterruptableExecutor::new(name, config.num_threads, order)?;
        Ok(Self {
            name,
            results: Arc::new(InfoflowResults::new(config.path_agnostic_results)),
            ctx,
            config,
            executor,
            termination: TerminationState::new(),
            handlers: RwLock::new(Vec::new()),
        })
    }

    pub(crate) fn config(&self) -> &PathConfig {
        &self.config
    }

    pub(crate) fn facts(&self) -> &FactArena<N> {
        self.ctx.facts()
    }

    pub(crate) fn icfg(&self) -> &dyn InterproceduralCfg<N, M> {
        self.ctx.icfg()
    }

    pub(crate) fn results(&self) -> Arc<InfoflowResults<N>> {
        Arc::clone(&self.results)
    }

    pub(crate) fn add_handler(&self, handler: Arc<dyn PathResultListener<N>>) {
        self.handlers.write().push(handler);
    }

    pub(crate) fn is_killed(&self) -> bool {
        self.termination.is_killed()
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.is_killed() || self.executor.is_finished()
    }

    pub(crate) fn reason(&self) -> Option<TerminationReason> {
        self.termination.reason()
    }

    pub(crate) fn clear_kill_flag(&self) {
        self.termination.reset();
    }

    pub(crate) fn add_status_listener(&self, listener: Arc<dyn SolverStatusListener>) {
        self.termination.add_listener(listener);
    }

    pub(crate) fn kill(&self, reason: TerminationReason) {
        if self.termination.kill(reason.clone()) {
            warn!(builder = self.name, reason = %reason, "Path reconstruction terminated");
        }
        self.executor.interrupt();
    }

    /// Queue a dependent task unless the builder was killed
    pub(crate) fn schedule<F>(&self, priority: usize, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        !self.is_killed() && self.executor.execute_prioritized(priority, task)
    }

    /// Add `record` and notify handlers if it is new
    pub(crate) fn report_result(&self, record: ResultRecord<N>) -> bool {
        if !self.results.add_result(record.clone()) {
            return false;
        }
        debug!(
            builder = self.name,
            source = ?record.source_stmt,
            sink = ?record.sink_stmt,
            "Source-to-sink connection found"
        );
        let handlers = self.handlers.read().clone();
        for handler in &handlers {
            handler.on_result_available(&record);
        }
        true
    }

    /// Register a result if `fact` is a root of the fact graph
    ///
    /// Returns false while the walk has to continue. A root without a
    /// source context (the zero fact) ends the walk without a result.
    pub(crate) fn record_source(&self, fact: FactId, scap: &SourceContextAndPath<N>) -> bool {
        let facts = self.facts();
        let f = &facts[fact];
        if f.predecessor().is_some() {
            return false;
        }
        let Some(source) = f.source_context() else {
            return true;
        };
        self.report_result(ResultRecord {
            sink_definition: scap.definition().clone(),
            sink_access_path: scap.access_path().clone(),
            sink_stmt: scap.stmt().clone(),
            source_definition: source.definition.clone(),
            source_access_path: source.access_path.clone(),
            source_stmt: source.stmt.clone(),
            user_data: source.user_data.clone(),
            path: scap.statement_path(facts),
        });
        true
    }

    /// Start one walk per sink fact (and its neighbors when
    /// `trigger_neighbors`), then block until the executor drains, the
    /// builder is killed or the reconstruction timeout expires
    pub(crate) fn run_sinks<F>(
        &self,
        solver: &dyn MemoryBoundedSolver,
        sinks: &[AbstractionAtSink<N>],
        trigger_neighbors: bool,
        mut spawn: F,
    ) -> Result<()>
    where
        F: FnMut(&AbstractionAtSink<N>),
    {
        if sinks.is_empty() {
            return Ok(());
        }
        info!(
            builder = self.name,
            sinks = sinks.len(),
            "Obtained connections between sources and sinks"
        );
        let started = Instant::now();
        self.executor.reset();
        self.termination.notify_started(solver);

        let outcome = self.drive(sinks, trigger_neighbors, &mut spawn, started);

        self.executor.shutdown();
        self.termination.notify_terminated(solver);
        outcome
    }

    fn drive<F>(
        &self,
        sinks: &[AbstractionAtSink<N>],
        trigger_neighbors: bool,
        spawn: &mut F,
        started: Instant,
    ) -> Result<()>
    where
        F: FnMut(&AbstractionAtSink<N>),
    {
        for (idx, sink) in sinks.iter().enumerate() {
            if self.is_killed() {
                debug!(builder = self.name, remaining = sinks.len() - idx, "Skipping sinks after kill");
                break;
            }
            debug!(builder = self.name, index = idx + 1, fact = %sink.fact, "Building path");
            spawn(sink);
            if trigger_neighbors {
                for neighbor in self.facts()[sink.fact].neighbors() {
                    spawn(&AbstractionAtSink::new(
                        sink.sink_definition.clone(),
                        neighbor,
                        sink.sink_stmt.clone(),
                    ));
                }
            }
            if self.config.sequential_path_processing {
                self.await_tasks(started)?;
            }
        }
        self.await_tasks(started)
    }

    fn await_tasks(&self, started: Instant) -> Result<()> {
        let Some(limit) = self.config.reconstruction_timeout() else {
            return self.executor.await_completion();
        };
        let remaining = limit.saturating_sub(started.elapsed());
        if self.executor.await_completion_timeout(remaining)? {
            return Ok(());
        }
        self.kill(TerminationReason::Timeout {
            elapsed: started.elapsed(),
            limit,
        });
        if !self.executor.await_completion_timeout(KILL_GRACE)? {
            warn!(
                builder = self.name,
                grace_secs = KILL_GRACE.as_secs(),
                "Path tasks still running after timeout, returning partial results"
            );
        }
        Ok(())
    }
}

/// `MemoryBoundedSolver` for a builder whose shared state lives in
/// `self.inner.base` and whose inner type has a `reset_caches` method
macro_rules! memory_bounded_via_base {
    ($builder:ident) => {
        impl<N: $crate::shared::GraphKey, M: $crate::shared::GraphKey>
            $crate::features::ifds::ports::MemoryBoundedSolver for $builder<N, M>
        {
            fn force_terminate(
                &self,
                reason: $crate::features::ifds::infrastructure::termination::TerminationReason,
            ) {
                self.inner.base.kill(reason);
            }

            fn is_terminated(&self) -> bool {
                self.inner.base.is_terminated()
            }

            fn is_killed(&self) -> bool {
                self.inner.base.is_killed()
            }

            fn reset(&self) {
                self.inner.base.clear_kill_flag();
                self.inner.reset_caches();
            }

            fn termination_reason(
                &self,
            ) -> Option<$crate::features::ifds::infrastructure::termination::TerminationReason>
            {
                self.inner.base.reason()
            }

            fn add_status_listener(
                &self,
                listener: std::sync::Arc<dyn $crate::features::ifds::ports::SolverStatusListener>,
            ) {
                self.inner.base.add_status_listener(listener);
            }
        }
    };
}

pub(crate) use memory_bounded_via_base;
