//! Source-to-sink connections found by path reconstruction

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

use crate::features::ifds::domain::{AccessPath, SourceSinkDefinition};
use crate::shared::GraphKey;

/// One reconstructed flow from a source to a sink
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultRecord<N> {
    pub sink_definition: SourceSinkDefinition,
    pub sink_access_path: AccessPath,
    pub sink_stmt: N,
    pub source_definition: SourceSinkDefinition,
    pub source_access_path: AccessPath,
    pub source_stmt: N,
    pub user_data: Option<Arc<str>>,
    /// Statements from source to sink, when paths are reconstructed
    pub path: Option<Vec<N>>,
}

impl<N> ResultRecord<N> {
    fn without_path(&self) -> Self
    where
        N: Clone,
    {
        Self {
            path: None,
            ..self.clone()
        }
    }
}

/// Deduplicated result set shared by a path builder and its callers
///
/// When results are path-agnostic, records that differ only in their path
/// collapse into the first one added.
pub struct InfoflowResults<N: GraphKey> {
    records: DashMap<ResultRecord<N>, ResultRecord<N>, FxBuildHasher>,
    path_agnostic: bool,
}

impl<N: GraphKey> InfoflowResults<N> {
    pub fn new(path_agnostic: bool) -> Self {
        Self {
            records: DashMap::with_hasher(FxBuildHasher),
            path_agnostic,
        }
    }

    /// Add a record; false if an equal one is already present
    pub fn add_result(&self, record: ResultRecord<N>) -> bool {
        let key = if self.path_agnostic {
            record.without_path()
        } else {
            record.clone()
        };
        match self.records.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_path_agnostic(&self) -> bool {
        self.path_agnostic
    }

    /// Snapshot of all records
    pub fn results(&self) -> Vec<ResultRecord<N>> {
        self.records.iter().map(|e| e.value().clone()).collect()
    }

    /// Records whose source is `source_stmt`
    pub fn from_source(&self, source_stmt: &N) -> Vec<ResultRecord<N>> {
        self.records
            .iter()
            .filter(|e| &e.value().source_stmt == source_stmt)
            .map(|e| e.value().clone())
            .collect()
    }

    /// Records whose sink is `sink_stmt`
    pub fn at_sink(&self, sink_stmt: &N) -> Vec<ResultRecord<N>> {
        self.records
            .iter()
            .filter(|e| &e.value().sink_stmt == sink_stmt)
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn clear(&self) {
        self.records.clear();
    }
}
