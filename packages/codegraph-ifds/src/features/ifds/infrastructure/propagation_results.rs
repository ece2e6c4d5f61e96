//! Solver-side collection of facts that reached a sink

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::features::ifds::domain::{AbstractionAtSink, FactArena, FactKey, SourceSinkDefinition};
use crate::features::ifds::ports::PropagationResultListener;
use crate::shared::GraphKey;

type SinkKey<N> = (SourceSinkDefinition, FactKey<N>, N);

/// Facts at sinks, deduplicated by (definition, fact value, statement)
///
/// Flow functions call [`add_result`](Self::add_result) when a fact reaches
/// a sink. The fact is re-derived at the sink statement; a second arrival of
/// an equal fact is kept as a neighbor of the first so the path builder still
/// sees both histories.
pub struct TaintPropagationResults<N: GraphKey> {
    facts: Arc<FactArena<N>>,
    results: DashMap<SinkKey<N>, AbstractionAtSink<N>, FxBuildHasher>,
    listeners: RwLock<Vec<Arc<dyn PropagationResultListener<N>>>>,
    stop_requested: AtomicBool,
}

impl<N: GraphKey> TaintPropagationResults<N> {
    pub fn new(facts: Arc<FactArena<N>>) -> Self {
        Self {
            facts,
            results: DashMap::with_hasher(FxBuildHasher),
            listeners: RwLock::new(Vec::new()),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Record a sink hit; false once a listener asked to stop
    pub fn add_result(&self, result: AbstractionAtSink<N>) -> bool {
        let at_sink = self
            .facts
            .derive_at_sink(result.fact, result.sink_stmt.clone());
        let record = AbstractionAtSink::new(result.sink_definition, at_sink, result.sink_stmt);
        let key = (
            record.sink_definition.clone(),
            self.facts.key(at_sink),
            record.sink_stmt.clone(),
        );

        match self.results.entry(key) {
            Entry::Occupied(existing) => {
                let first = existing.get().fact;
                drop(existing);
                self.facts.add_neighbor(first, at_sink);
            }
            Entry::Vacant(slot) => {
                debug!(
                    sink = %record.sink_definition,
                    stmt = ?record.sink_stmt,
                    fact = %self.facts[at_sink].access_path(),
                    "Fact reached sink"
                );
                slot.insert(record.clone());
            }
        }

        let listeners = self.listeners.read().clone();
        let mut keep_going = true;
        for listener in &listeners {
            if !listener.on_result_available(&record) {
                keep_going = false;
            }
        }
        if !keep_going {
            self.stop_requested.store(true, Ordering::Release);
        }
        keep_going && !self.stop_requested()
    }

    pub fn add_listener(&self, listener: Arc<dyn PropagationResultListener<N>>) {
        self.listeners.write().push(listener);
    }

    /// A listener returned false
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Snapshot of the distinct sink hits
    pub fn results(&self) -> Vec<AbstractionAtSink<N>> {
        let mut out: Vec<AbstractionAtSink<N>> =
            self.results.iter().map(|e| e.value().clone()).collect();
        out.sort_by_key(|r| r.fact);
        out
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn facts(&self) -> &Arc<FactArena<N>> {
        &self.facts
    }
}
