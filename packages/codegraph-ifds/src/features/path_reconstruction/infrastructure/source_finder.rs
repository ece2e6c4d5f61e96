//! Fast source lookup without paths
//!
//! Each sink fact gets one task that floods the predecessor/neighbor graph
//! and reports every source it reaches. A per-task flag on each fact stops
//! the flood from visiting a fact twice. Results never carry a path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::base::{memory_bounded_via_base, BuilderBase};
use crate::config::PathConfig;
use crate::errors::Result;
use crate::features::ifds::context::AnalysisContext;
use crate::features::ifds::domain::AbstractionAtSink;
use crate::features::ifds::infrastructure::executor::QueueOrder;
use crate::features::path_reconstruction::domain::{InfoflowResults, ResultRecord};
use crate::features::path_reconstruction::ports::{AbstractionPathBuilder, PathResultListener};
use crate::shared::GraphKey;

pub(crate) struct SourceFinderInner<N: GraphKey, M: GraphKey> {
    pub(crate) base: BuilderBase<N, M>,
    // restarts at zero every run, together with the facts' path flags
    next_task_id: AtomicUsize,
}

impl<N: GraphKey, M: GraphKey> SourceFinderInner<N, M> {
    pub(crate) fn reset_caches(&self) {
        self.next_task_id.store(0, Ordering::Relaxed);
        self.base.facts().clear_path_flags();
    }

    fn spawn_for_sink(self: &Arc<Self>, sink: &AbstractionAtSink<N>) {
        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        self.base.facts()[sink.fact].register_path_flag(task_id);
        let this = Arc::clone(self);
        let sink = sink.clone();
        self.base.schedule(0, move || this.run_task(task_id, sink));
    }

    fn run_task(&self, task_id: usize, sink: AbstractionAtSink<N>) {
        let facts = self.base.facts();
        let sink_access_path = facts[sink.fact].access_path().clone();
        let mut queue = VecDeque::from([sink.fact]);

        while let Some(fact) = queue.pop_front() {
            if self.base.is_killed() {
                return;
            }
            let f = &facts[fact];
            if let Some(source) = f.source_context() {
                self.base.report_result(ResultRecord {
                    sink_definition: sink.sink_definition.clone(),
                    sink_access_path: sink_access_path.clone(),
                    sink_stmt: sink.sink_stmt.clone(),
                    source_definition: source.definition.clone(),
                    source_access_path: source.access_path.clone(),
                    source_stmt: source.stmt.clone(),
                    user_data: source.user_data.clone(),
                    path: None,
                });
            } else if let Some(pred) = f.predecessor() {
                if facts[pred].register_path_flag(task_id) {
                    queue.push_back(pred);
                }
            }
            for neighbor in f.neighbors() {
                if facts[neighbor].register_path_flag(task_id) {
                    queue.push_back(neighbor);
                }
            }
        }
    }
}

/// Source finder; the cheapest builder, reports connections only
pub struct ContextInsensitiveSourceFinder<N: GraphKey, M: GraphKey> {
    inner: Arc<SourceFinderInner<N, M>>,
}

impl<N: GraphKey, M: GraphKey> ContextInsensitiveSourceFinder<N, M> {
    pub fn new(ctx: AnalysisContext<N, M>, config: PathConfig) -> Result<Self> {
        let base = BuilderBase::new("path-builder-sf", ctx, config, QueueOrder::Fifo)?;
        Ok(Self {
            inner: Arc::new(SourceFinderInner {
                base,
                next_task_id: AtomicUsize::new(0),
            }),
        })
    }
}

impl<N: GraphKey, M: GraphKey> AbstractionPathBuilder<N> for ContextInsensitiveSourceFinder<N, M> {
    fn compute_taint_paths(&self, sinks: &[AbstractionAtSink<N>]) -> Result<()> {
        let inner = &self.inner;
        inner.reset_caches();
        // the flood already follows neighbors
        inner
            .base
            .run_sinks(self, sinks, false, |sink| inner.spawn_for_sink(sink))
    }

    fn run_incremental_path_computation(&self) -> Result<()> {
        Ok(())
    }

    fn results(&self) -> Arc<InfoflowResults<N>> {
        self.inner.base.results()
    }

    fn add_result_available_handler(&self, handler: Arc<dyn PathResultListener<N>>) {
        self.inner.base.add_handler(handler);
    }
}

memory_bounded_via_base!(ContextInsensitiveSourceFinder);
