//! Concurrent jump-function, end-summary and incoming tables
//!
//! Every mutation is insert-if-absent. Readers get snapshots so no map guard
//! is held while flow functions run.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::features::ifds::domain::{FactId, FactKey};
use crate::shared::GraphKey;

type JumpKey<N> = (FactKey<N>, N, FactKey<N>);

/// Recorded path edges `(d1, n, d2)`, mapped to the first fact seen for `d2`
pub struct JumpFunctionTable<N: GraphKey> {
    map: DashMap<JumpKey<N>, FactId, FxBuildHasher>,
}

impl<N: GraphKey> JumpFunctionTable<N> {
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Record the edge; returns the already stored fact if it existed
    pub fn add_function(
        &self,
        source: FactKey<N>,
        target: N,
        target_key: FactKey<N>,
        target_fact: FactId,
    ) -> Option<FactId> {
        match self.map.entry((source, target, target_key)) {
            Entry::Occupied(e) => Some(*e.get()),
            Entry::Vacant(e) => {
                e.insert(target_fact);
                None
            }
        }
    }

    pub fn contains(&self, source: &FactKey<N>, target: &N, target_key: &FactKey<N>) -> bool {
        self.map
            .contains_key(&(source.clone(), target.clone(), target_key.clone()))
    }

    /// Facts recorded at `node` under any entry fact
    pub fn facts_at(&self, node: &N) -> Vec<FactId> {
        let mut out: Vec<FactId> = self
            .map
            .iter()
            .filter(|e| &e.key().1 == node)
            .map(|e| *e.value())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        self.map.clear();
    }
}

impl<N: GraphKey> Default for JumpFunctionTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

struct SummarySet<N> {
    seen: FxHashSet<(N, FactKey<N>)>,
    entries: Vec<(N, FactId)>,
}

/// `(method, entry fact)` to the exit pairs computed for it
pub struct EndSummaryTable<N: GraphKey, M: GraphKey> {
    map: DashMap<(M, FactKey<N>), SummarySet<N>, FxBuildHasher>,
    zero: FactKey<N>,
}

impl<N: GraphKey, M: GraphKey> EndSummaryTable<N, M> {
    pub fn new(zero: FactKey<N>) -> Self {
        Self {
            map: DashMap::with_hasher(FxBuildHasher),
            zero,
        }
    }

    /// Record an exit pair; false if it was already known
    ///
    /// Summaries under the zero entry fact are never stored and always
    /// report true.
    pub fn add(
        &self,
        method: M,
        entry: FactKey<N>,
        exit_stmt: N,
        exit_key: FactKey<N>,
        exit_fact: FactId,
    ) -> bool {
        if entry == self.zero {
            return true;
        }
        let mut set = self.map.entry((method, entry)).or_insert_with(|| SummarySet {
            seen: FxHashSet::default(),
            entries: Vec::new(),
        });
        if set.seen.insert((exit_stmt.clone(), exit_key)) {
            set.entries.push((exit_stmt, exit_fact));
            true
        } else {
            false
        }
    }

    /// Snapshot of the exit pairs, in discovery order
    pub fn get(&self, method: &M, entry: &FactKey<N>) -> Vec<(N, FactId)> {
        self.map
            .get(&(method.clone(), entry.clone()))
            .map(|set| set.entries.clone())
            .unwrap_or_default()
    }

    /// Number of stored exit pairs
    pub fn len(&self) -> usize {
        self.map.iter().map(|e| e.value().entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        self.map.clear();
    }
}

/// Callers that entered one `(method, entry fact)`: the call site plus, per
/// caller entry fact, the `(d1, d2)` pair at the call
pub type IncomingSnapshot<N> = Vec<(N, Vec<(FactId, FactId)>)>;

struct IncomingSet<N> {
    sites: Vec<(N, Vec<(FactKey<N>, FactId, FactId)>)>,
}

/// `(method, entry fact)` to the call contexts that entered it
pub struct IncomingTable<N: GraphKey, M: GraphKey> {
    map: DashMap<(M, FactKey<N>), IncomingSet<N>, FxBuildHasher>,
}

impl<N: GraphKey, M: GraphKey> IncomingTable<N, M> {
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Register `call_site` entering `method` with `entry`; true if the
    /// (call site, caller entry fact) pair is new
    pub fn add(
        &self,
        method: M,
        entry: FactKey<N>,
        call_site: N,
        caller_entry_key: FactKey<N>,
        caller_entry: FactId,
        call_fact: FactId,
    ) -> bool {
        let mut set = self
            .map
            .entry((method, entry))
            .or_insert_with(|| IncomingSet { sites: Vec::new() });
        let pos = match set.sites.iter().position(|(site, _)| *site == call_site) {
            Some(pos) => pos,
            None => {
                set.sites.push((call_site, Vec::new()));
                set.sites.len() - 1
            }
        };
        let contexts = &mut set.sites[pos].1;
        if contexts.iter().any(|(key, _, _)| *key == caller_entry_key) {
            return false;
        }
        contexts.push((caller_entry_key, caller_entry, call_fact));
        true
    }

    /// Snapshot of the registered call contexts
    pub fn get(&self, method: &M, entry: &FactKey<N>) -> IncomingSnapshot<N> {
        self.map
            .get(&(method.clone(), entry.clone()))
            .map(|set| {
                set.sites
                    .iter()
                    .map(|(site, ctx)| {
                        (
                            site.clone(),
                            ctx.iter().map(|(_, d1, d2)| (*d1, *d2)).collect(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_incoming(&self, method: &M, entry: &FactKey<N>) -> bool {
        self.map
            .get(&(method.clone(), entry.clone()))
            .is_some_and(|set| !set.sites.is_empty())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        self.map.clear();
    }
}

impl<N: GraphKey, M: GraphKey> Default for IncomingTable<N, M> {
    fn default() -> Self {
        Self::new()
    }
}
