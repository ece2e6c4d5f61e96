//! Context-insensitive path reconstruction
//!
//! Same backward walk as the context-sensitive builder, without matching
//! call sites on the way out of a callee. Every predecessor and neighbor is
//! followed, so it over-approximates the set of sources but never misses one.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
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

pub(crate) struct ContextInsensitiveInner<N: GraphKey, M: GraphKey> {
    pub(crate) base: BuilderBase<N, M>,
    path_cache: PathCache<N>,
}

impl<N: GraphKey, M: GraphKey> ContextInsensitiveInner<N, M> {
    pub(crate) fn reset_caches(&self) {
        self.path_cache.clear();
    }

    fn schedule(self: &Arc<Self>, fact: FactId) {
        let this = Arc::clone(self);
        self.base.schedule(0, move || this.run_task(fact));
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
        let fresh = self
            .path_cache
            .entry(sink.fact)
            .or_default()
            .insert(Arc::clone(&scap));
        if fresh && !self.base.record_source(sink.fact, &scap) {
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
        let paths: Vec<Scap<N>> = self
            .path_cache
            .get(&fact)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default();

        for scap in paths {
            if self.base.is_killed() {
                return;
            }
            if self.process_predecessor(&scap, pred) {
                self.schedule(pred);
            }
            for &neighbor in &neighbors {
                if self.process_predecessor(&scap, neighbor) {
                    self.schedule(neighbor);
                }
            }
        }
    }

    /// Extend `scap` onto `pred`; true if the walk continues from there
    fn process_predecessor(&self, scap: &SourceContextAndPath<N>, pred: FactId) -> bool {
        let facts = self.base.facts();
        let config = self.base.config();
        let Some(extended) = scap.extend_path(pred, facts, config) else {
            return false;
        };
        let extended = Arc::new(extended);
        self.base.record_source(pred, &extended);

        let max_paths = config.max_paths_per_abstraction;
        let mut paths = self.path_cache.entry(pred).or_default();
        if max_paths > 0 && paths.len() > max_paths {
            return false;
        }
        paths.insert(extended)
    }
}

pub struct ContextInsensitivePathBuilder<N: GraphKey, M: GraphKey> {
    inner: Arc<ContextInsensitiveInner<N, M>>,
}

impl<N: GraphKey, M: GraphKey> ContextInsensitivePathBuilder<N, M> {
    pub fn new(ctx: AnalysisContext<N, M>, config: PathConfig) -> Result<Self> {
        let base = BuilderBase::new("path-builder-ci", ctx, config, QueueOrder::Fifo)?;
        Ok(Self {
            inner: Arc::new(ContextInsensitiveInner {
                base,
                path_cache: DashMap::with_hasher(FxBuildHasher),
            }),
        })
    }
}

impl<N: GraphKey, M: GraphKey> AbstractionPathBuilder<N> for ContextInsensitivePathBuilder<N, M> {
    fn compute_taint_paths(&self, sinks: &[AbstractionAtSink<N>]) -> Result<()> {
        let inner = &self.inner;
        inner
            .base
            .run_sinks(self, sinks, true, |sink| inner.spawn_for_sink(sink))
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

memory_bounded_via_base!(ContextInsensitivePathBuilder);
