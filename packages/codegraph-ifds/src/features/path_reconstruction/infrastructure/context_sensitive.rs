//! Context-sensitive path reconstruction
//!
//! Walks predecessor chains backwards from each sink fact while keeping a
//! call stack: leaving a callee backwards through a return pushes the call
//! site, reaching a call statement pops it and the two must agree. Shorter
//! partial paths are processed first.
//!
//! A walk that reaches a fact someone else already walked with an equal
//! partial path stops there and is remembered as deferred. After the
//! executor drains, deferred walks are completed with the tails of walks that
//! reached a source.

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::sync::Arc;
use tracing::debug;

use super::base::{memory_bounded_via_base, neighbor_sinks, BuilderBase, PathCache};
use crate::config::PathConfig;
use crate::errors::Result;
use crate::features::ifds::context::AnalysisContext;
use crate::features::ifds::domain::{AbstractionAtSink, FactId};
use crate::features::ifds::infrastructure::executor::QueueOrder;
use crate::features::path_reconstruction::domain::{InfoflowResults, SourceContextAndPath};
use crate::features::path_reconstruction::ports::{AbstractionPathBuilder, PathResultListener};
use crate::shared::GraphKey;

type Scap<N> = Arc<SourceContextAndPath<N>>;

enum PathStep<N> {
    /// First time this partial path reaches the fact: keep walking
    New,
    /// Equal partial path already cached at the fact
    Cached(Scap<N>),
    Infeasible,
}

pub(crate) struct ContextSensitiveInner<N: GraphKey, M: GraphKey> {
    pub(crate) base: BuilderBase<N, M>,
    path_cache: PathCache<N>,
    deferred_paths: Mutex<FxHashSet<Scap<N>>>,
    source_reaching: Mutex<FxHashSet<Scap<N>>>,
}

impl<N: GraphKey, M: GraphKey> ContextSensitiveInner<N, M> {
    fn cache_put(&self, fact: FactId, scap: Scap<N>) -> bool {
        self.path_cache.entry(fact).or_default().insert(scap)
    }

    fn cached_paths(&self, fact: FactId) -> Vec<Scap<N>> {
        self.path_cache
            .get(&fact)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn cached_count(&self, fact: FactId) -> usize {
        self.path_cache.get(&fact).map(|paths| paths.len()).unwrap_or(0)
    }

    pub(crate) fn reset_caches(&self) {
        self.path_cache.clear();
        self.deferred_paths.lock().clear();
        self.source_reaching.lock().clear();
    }

    fn schedule(self: &Arc<Self>, fact: FactId) {
        let priority = self.base.facts()[fact].path_length();
        let this = Arc::clone(self);
        self.base.schedule(priority, move || this.run_task(fact));
    }

    fn spawn_for_sink(self: &Arc<Self>, sink: &AbstractionAtSink<N>) {
        let facts = self.base.facts();
        let config = self.base.config();
        let start = SourceContextAndPath::new(
            sink.sink_definition.clone(),
            facts[sink.fact].access_path().clone(),
            sink.sink_stmt.clone(),
            config.path_agnostic_results,
        );
        let Some(scap) = start.extend_path(sink.fact, facts, config) else {
            return;
        };
        let scap = Arc::new(scap);
        if self.cache_put(sink.fact, Arc::clone(&scap)) && !self.base.record_source(sink.fact, &scap)
        {
            self.schedule(sink.fact);
        }
    }

    fn run_task(self: &Arc<Self>, fact: FactId) {
        if self.base.is_killed() {
            return;
        }
        let facts = self.base.facts();
        let Some(pred) = facts[fact].predecessor() else {
            return;
        };
        let neighbors = facts[pred].neighbors();
        for scap in self.cached_paths(fact) {
            if self.base.is_killed() {
                return;
            }
            self.process_and_queue(pred, &scap);
            for &neighbor in &neighbors {
                self.process_and_queue(neighbor, &scap);
            }
        }
    }

    fn process_and_queue(self: &Arc<Self>, pred: FactId, scap: &SourceContextAndPath<N>) {
        match self.process_predecessor(scap, pred) {
            PathStep::New => self.schedule(pred),
            PathStep::Cached(extended) => {
                if self.base.config().path_reconstruction_mode.reconstruct_paths() {
                    self.deferred_paths.lock().insert(extended);
                }
            }
            PathStep::Infeasible => {}
        }
    }

    fn process_predecessor(&self, scap: &SourceContextAndPath<N>, pred: FactId) -> PathStep<N> {
        let facts = self.base.facts();
        let config = self.base.config();
        let p = &facts[pred];

        // Call-to-return edge: the fact never entered the callee
        if p.current_stmt().is_some() && p.current_stmt() == p.corresponding_call_site() {
            let Some(extended) = scap.extend_path(pred, facts, config) else {
                return PathStep::Infeasible;
            };
            let extended = Arc::new(extended);
            if self.base.record_source(pred, &extended) {
                self.source_reaching.lock().insert(Arc::clone(&extended));
            }
            return if self.cache_put(pred, Arc::clone(&extended)) {
                PathStep::New
            } else {
                PathStep::Cached(extended)
            };
        }

        let Some(mut extended) = scap.extend_path(pred, facts, config) else {
            return PathStep::Infeasible;
        };

        // Reaching a call statement backwards leaves the callee
        if let Some(stmt) = p.current_stmt() {
            if self.base.icfg().is_call_stmt(stmt) {
                if let Some((popped, site)) = extended.pop_top_call_stack_item() {
                    if &site != stmt {
                        return PathStep::Infeasible;
                    }
                    extended = popped;
                }
            }
        }

        let extended = Arc::new(extended);
        if self.base.record_source(pred, &extended) {
            self.source_reaching.lock().insert(Arc::clone(&extended));
        }

        let max_paths = config.max_paths_per_abstraction;
        if max_paths > 0 && self.cached_count(pred) > max_paths {
            return PathStep::Infeasible;
        }
        if self.cache_put(pred, Arc::clone(&extended)) {
            PathStep::New
        } else {
            PathStep::Cached(extended)
        }
    }

    /// Complete deferred walks with the tails of source-reaching ones
    fn build_paths_from_cache(&self) {
        let deferred: Vec<Scap<N>> = self.deferred_paths.lock().iter().cloned().collect();
        let sources: Vec<Scap<N>> = self.source_reaching.lock().iter().cloned().collect();
        if deferred.is_empty() || sources.is_empty() {
            return;
        }
        debug!(
            deferred = deferred.len(),
            source_reaching = sources.len(),
            "Merging deferred paths"
        );
        let facts = self.base.facts();
        for pending in &deferred {
            for source in &sources {
                if let Some(full) = pending.extend_with(source, facts) {
                    if let Some(last) = full.last_fact() {
                        self.base.record_source(last, &full);
                    }
                }
            }
        }
    }
}

/// Context-sensitive builder; the default reconstruction algorithm
pub struct ContextSensitivePathBuilder<N: GraphKey, M: GraphKey> {
    inner: Arc<ContextSensitiveInner<N, M>>,
}

impl<N: GraphKey, M: GraphKey> ContextSensitivePathBuilder<N, M> {
    pub fn new(ctx: AnalysisContext<N, M>, config: PathConfig) -> Result<Self> {
        let base = BuilderBase::new("path-builder-cs", ctx, config, QueueOrder::ShortestFirst)?;
        Ok(Self {
            inner: Arc::new(ContextSensitiveInner {
                base,
                path_cache: DashMap::with_hasher(FxBuildHasher),
                deferred_paths: Mutex::new(FxHashSet::default()),
                source_reaching: Mutex::new(FxHashSet::default()),
            }),
        })
    }

    /// Facts with at least one cached partial path
    pub fn cached_fact_count(&self) -> usize {
        self.inner.path_cache.len()
    }
}

impl<N: GraphKey, M: GraphKey> AbstractionPathBuilder<N> for ContextSensitivePathBuilder<N, M> {
    fn compute_taint_paths(&self, sinks: &[AbstractionAtSink<N>]) -> Result<()> {
        let inner = &self.inner;
        let outcome = inner
            .base
            .run_sinks(self, sinks, true, |sink| inner.spawn_for_sink(sink));
        inner.build_paths_from_cache();
        outcome
    }

    fn run_incremental_path_computation(&self) -> Result<()> {
        let sinks = neighbor_sinks(self.inner.base.facts(), &self.inner.path_cache);
        if sinks.is_empty() {
            return Ok(());
        }
        debug!(sinks = sinks.len(), "Incremental path reconstruction");
        self.compute_taint_paths(&sinks)
    }

    fn results(&self) -> Arc<InfoflowResults<N>> {
        self.inner.base.results()
    }

    fn add_result_available_handler(&self, handler: Arc<dyn PathResultListener<N>>) {
        self.inner.base.add_handler(handler);
    }
}

memory_bounded_via_base!(ContextSensitivePathBuilder);
