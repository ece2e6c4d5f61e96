//! Fact model and the per-run fact arena
//!
//! Facts are stored in an append-only arena and linked by [`FactId`]:
//! predecessor and neighbor links are indices, so a fact graph with heavy
//! sharing has no ownership cycles and is torn down in one piece when the
//! arena is dropped.
//!
//! Equality for deduplication is carried by [`FactValue`] (access path plus
//! source context). Predecessor, neighbors, current statement and call site
//! are history and never take part in it.

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use super::access_path::AccessPath;
use super::source_context::SourceContext;

/// Index of a fact in its [`FactArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(usize);

impl FactId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// The identity of a fact for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactValue<N> {
    pub access_path: AccessPath,
    pub source: Option<SourceContext<N>>,
}

/// Shared, value-compared fact identity used as a table key
pub type FactKey<N> = Arc<FactValue<N>>;

/// A propagated abstraction
pub struct Fact<N> {
    value: FactKey<N>,
    current_stmt: Option<N>,
    call_site: Option<N>,
    predecessor: Option<FactId>,
    path_length: usize,
    neighbors: Mutex<FxHashSet<FactId>>,
    path_flags: Mutex<Vec<u64>>,
}

impl<N> Fact<N> {
    fn new(
        value: FactKey<N>,
        current_stmt: Option<N>,
        call_site: Option<N>,
        predecessor: Option<FactId>,
        path_length: usize,
    ) -> Self {
        Self {
            value,
            current_stmt,
            call_site,
            predecessor,
            path_length,
            neighbors: Mutex::new(FxHashSet::default()),
            path_flags: Mutex::new(Vec::new()),
        }
    }

    pub fn value(&self) -> &FactKey<N> {
        &self.value
    }

    pub fn access_path(&self) -> &AccessPath {
        &self.value.access_path
    }

    pub fn source_context(&self) -> Option<&SourceContext<N>> {
        self.value.source.as_ref()
    }

    pub fn current_stmt(&self) -> Option<&N> {
        self.current_stmt.as_ref()
    }

    /// Call site this fact returned through, if it crossed a return edge
    pub fn corresponding_call_site(&self) -> Option<&N> {
        self.call_site.as_ref()
    }

    pub fn predecessor(&self) -> Option<FactId> {
        self.predecessor
    }

    pub fn path_length(&self) -> usize {
        self.path_length
    }

    /// Root fact carrying a source context
    pub fn is_source(&self) -> bool {
        self.predecessor.is_none() && self.value.source.is_some()
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbors.lock().len()
    }

    /// Snapshot of the neighbor set, ordered by id
    pub fn neighbors(&self) -> Vec<FactId> {
        let mut out: Vec<FactId> = self.neighbors.lock().iter().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn has_neighbor(&self, other: FactId) -> bool {
        self.neighbors.lock().contains(&other)
    }

    /// Mark this fact as visited by `task_id`; false if it already was
    pub fn register_path_flag(&self, task_id: usize) -> bool {
        let word = task_id / 64;
        let bit = 1u64 << (task_id % 64);
        let mut flags = self.path_flags.lock();
        if flags.len() <= word {
            flags.resize(word + 1, 0);
        }
        let fresh = flags[word] & bit == 0;
        flags[word] |= bit;
        fresh
    }

    /// Forget all path flags so task ids can be handed out again
    pub fn clear_path_flags(&self) {
        let mut flags = self.path_flags.lock();
        flags.clear();
        flags.shrink_to_fit();
    }

    /// 64-bit words currently held for path flags
    pub fn path_flag_words(&self) -> usize {
        self.path_flags.lock().len()
    }
}

impl<N: fmt::Debug> fmt::Debug for Fact<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fact")
            .field("access_path", &self.value.access_path.to_string())
            .field("source", &self.value.source.is_some())
            .field("current_stmt", &self.current_stmt)
            .field("call_site", &self.call_site)
            .field("predecessor", &self.predecessor)
            .field("path_length", &self.path_length)
            .finish()
    }
}

/// Append-only, thread-safe owner of every fact of one analysis run
pub struct FactArena<N> {
    facts: boxcar::Vec<Fact<N>>,
    zero: FactId,
}

impl<N: Clone + Eq + std::hash::Hash> FactArena<N> {
    pub fn new() -> Self {
        let facts = boxcar::Vec::new();
        let zero_value = Arc::new(FactValue {
            access_path: AccessPath::zero(),
            source: None,
        });
        let zero = FactId(facts.push(Fact::new(zero_value, None, None, None, 0)));
        Self { facts, zero }
    }

    /// The always-present empty fact
    pub fn zero(&self) -> FactId {
        self.zero
    }

    pub fn is_zero(&self, id: FactId) -> bool {
        id == self.zero || self[id].value == self[self.zero].value
    }

    pub fn len(&self) -> usize {
        self.facts.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: FactId) -> Option<&Fact<N>> {
        self.facts.get(id.0)
    }

    /// Shared identity key of a fact
    pub fn key(&self, id: FactId) -> FactKey<N> {
        Arc::clone(&self[id].value)
    }

    /// Whether two facts denote the same access path and source
    pub fn same_value(&self, a: FactId, b: FactId) -> bool {
        a == b || self[a].value == self[b].value
    }

    fn alloc(&self, fact: Fact<N>) -> FactId {
        FactId(self.facts.push(fact))
    }

    /// Root fact tainting `access_path`, originating at `context.stmt`
    pub fn source(&self, access_path: AccessPath, context: SourceContext<N>) -> FactId {
        let stmt = context.stmt.clone();
        let value = Arc::new(FactValue {
            access_path,
            source: Some(context),
        });
        self.alloc(Fact::new(value, Some(stmt), None, None, 0))
    }

    /// Fact for `access_path` produced at `stmt` from `parent`
    ///
    /// Returns `parent` itself when nothing changes.
    pub fn derive(&self, parent: FactId, access_path: AccessPath, stmt: N) -> FactId {
        let p = &self[parent];
        if p.value.source.is_none()
            && p.value.access_path == access_path
            && p.current_stmt.as_ref() == Some(&stmt)
        {
            return parent;
        }
        self.derive_new(parent, access_path, Some(stmt), None)
    }

    /// Fact leaving a callee at `exit_stmt` back into `call_site`
    pub fn derive_on_return(
        &self,
        parent: FactId,
        access_path: AccessPath,
        exit_stmt: N,
        call_site: N,
    ) -> FactId {
        self.derive_new(parent, access_path, Some(exit_stmt), Some(call_site))
    }

    /// Same value at a new position, with `parent` as predecessor
    pub fn derive_at(&self, parent: FactId, stmt: N, call_site: Option<N>) -> FactId {
        let access_path = self[parent].value.access_path.clone();
        self.derive_new(parent, access_path, Some(stmt), call_site)
    }

    /// Fact reaching a sink; the sink statement doubles as call site
    pub fn derive_at_sink(&self, parent: FactId, sink_stmt: N) -> FactId {
        let access_path = self[parent].value.access_path.clone();
        self.derive_new(parent, access_path, Some(sink_stmt.clone()), Some(sink_stmt))
    }

    /// Copy of `fact` whose predecessor is `predecessor`
    pub fn derive_with_predecessor(&self, fact: FactId, predecessor: FactId) -> FactId {
        let f = &self[fact];
        let value = if f.value.source.is_some() {
            Arc::new(FactValue {
                access_path: f.value.access_path.clone(),
                source: None,
            })
        } else {
            Arc::clone(&f.value)
        };
        let path_length = self[predecessor].path_length + 1;
        self.alloc(Fact::new(
            value,
            f.current_stmt.clone(),
            f.call_site.clone(),
            Some(predecessor),
            path_length,
        ))
    }

    fn derive_new(
        &self,
        parent: FactId,
        access_path: AccessPath,
        current_stmt: Option<N>,
        call_site: Option<N>,
    ) -> FactId {
        let value = Arc::new(FactValue {
            access_path,
            source: None,
        });
        let path_length = self[parent].path_length + 1;
        self.alloc(Fact::new(
            value,
            current_stmt,
            call_site,
            Some(parent),
            path_length,
        ))
    }

    /// Record `neighbor` as an alternative history of `fact`
    ///
    /// Set insert: racing identical additions are harmless. A fact is never
    /// its own neighbor.
    pub fn add_neighbor(&self, fact: FactId, neighbor: FactId) -> bool {
        if fact == neighbor {
            return false;
        }
        self[fact].neighbors.lock().insert(neighbor)
    }

    /// Iterate over all facts with their ids
    pub fn iter(&self) -> impl Iterator<Item = (FactId, &Fact<N>)> {
        self.facts.iter().map(|(idx, fact)| (FactId(idx), fact))
    }

    pub fn clear_path_flags(&self) {
        for (_, fact) in self.iter() {
            fact.clear_path_flags();
        }
    }
}

impl<N: Clone + Eq + std::hash::Hash> Default for FactArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Index<FactId> for FactArena<N> {
    type Output = Fact<N>;

    fn index(&self, id: FactId) -> &Self::Output {
        &self.facts[id.0]
    }
}
