//! Partial taint paths walked backwards from a sink
//!
//! A [`SourceContextAndPath`] is the state of one backward walk: the sink it
//! started from, the facts visited so far and the call sites it still has to
//! leave through. Both lists are persistent, so extending a path shares its
//! prefix with every other extension of the same path.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::PathConfig;
use crate::features::ifds::domain::{AccessPath, FactArena, FactId, SourceContext, SourceSinkDefinition};
use crate::shared::{ConsList, GraphKey};

pub struct SourceContextAndPath<N> {
    sink: SourceContext<N>,
    path: ConsList<FactId>,
    call_stack: ConsList<N>,
    neighbor_counter: AtomicUsize,
    path_agnostic: bool,
}

impl<N: GraphKey> SourceContextAndPath<N> {
    /// Empty walk starting at a sink
    pub fn new(
        definition: SourceSinkDefinition,
        access_path: AccessPath,
        sink_stmt: N,
        path_agnostic: bool,
    ) -> Self {
        Self {
            sink: SourceContext::new(definition, access_path, sink_stmt),
            path: ConsList::new(),
            call_stack: ConsList::new(),
            neighbor_counter: AtomicUsize::new(0),
            path_agnostic,
        }
    }

    pub fn definition(&self) -> &SourceSinkDefinition {
        &self.sink.definition
    }

    pub fn access_path(&self) -> &AccessPath {
        &self.sink.access_path
    }

    pub fn stmt(&self) -> &N {
        &self.sink.stmt
    }

    pub fn path(&self) -> &ConsList<FactId> {
        &self.path
    }

    pub fn call_stack(&self) -> &ConsList<N> {
        &self.call_stack
    }

    /// Most recently visited fact
    pub fn last_fact(&self) -> Option<FactId> {
        self.path.last().copied()
    }

    pub fn is_call_stack_empty(&self) -> bool {
        self.call_stack.is_empty()
    }

    /// Neighbor count of the fact this walk was cached under
    pub fn neighbor_counter(&self) -> usize {
        self.neighbor_counter.load(Ordering::Acquire)
    }

    pub fn set_neighbor_counter(&self, counter: usize) {
        self.neighbor_counter.store(counter, Ordering::Release);
    }

    /// Step backwards onto `fact`
    ///
    /// Returns `None` when the step is infeasible: the fact is already on the
    /// path, the same method would be left through two different sites, or a
    /// length / call stack bound is exceeded.
    pub fn extend_path(
        &self,
        fact: FactId,
        facts: &FactArena<N>,
        config: &PathConfig,
    ) -> Option<Self> {
        let f = &facts[fact];
        let call_site = f.corresponding_call_site();
        let current = f.current_stmt();

        let mut scap = self.clone();
        scap.set_neighbor_counter(f.neighbor_count());

        if current.is_none() && call_site.is_none() {
            return Some(scap);
        }
        let track_path = config.path_reconstruction_mode.reconstruct_paths();
        if call_site.is_none() && !track_path {
            return Some(scap);
        }
        if self.path.contains(&fact) {
            return None;
        }

        if track_path && current.is_some() {
            if let Some(top) = self.last_fact() {
                let t = &facts[top];
                if facts.same_value(top, fact)
                    && t.corresponding_call_site().is_some()
                    && t.corresponding_call_site() == call_site
                    && t.current_stmt() != current
                {
                    return None;
                }
            }
            scap.path = scap.path.push(fact);
            if config.max_path_length > 0 && scap.path.len() > config.max_path_length {
                return None;
            }
        }

        if let Some(site) = call_site {
            if Some(site) != current {
                if config.max_call_stack_size > 0
                    && scap.call_stack.len() >= config.max_call_stack_size
                {
                    return None;
                }
                scap.call_stack = scap.call_stack.push(site.clone());
            }
        }

        Some(scap)
    }

    /// Complete this walk with the tail of a longer one that already
    /// reached a source
    ///
    /// `other` must pass through this walk's last fact (or one of its
    /// neighbors); its additional facts and call sites are appended.
    pub fn extend_with(&self, other: &Self, facts: &FactArena<N>) -> Option<Self> {
        if self.path.is_empty() || other.path.len() <= self.path.len() {
            return None;
        }
        let last = self.last_fact()?;

        let mut extra = Vec::new();
        let mut found = false;
        for &next in other.path.iter() {
            if next == last || facts[next].has_neighbor(last) {
                found = true;
                break;
            }
            extra.push(next);
        }
        if !found {
            return None;
        }

        let mut scap = self.clone();
        for &fact in extra.iter().rev() {
            scap.path = scap.path.push(fact);
        }

        let other_depth = other.call_stack.len();
        let own_depth = self.call_stack.len();
        if other_depth < own_depth {
            return None;
        }
        if other_depth > own_depth {
            let top = self.call_stack.last();
            let mut sites = Vec::new();
            for site in other.call_stack.iter() {
                if Some(site) == top {
                    break;
                }
                sites.push(site.clone());
            }
            for site in sites.into_iter().rev() {
                scap.call_stack = scap.call_stack.push(site);
            }
        }

        Some(scap)
    }

    /// Leave the innermost call: the remaining walk and the call site popped
    pub fn pop_top_call_stack_item(&self) -> Option<(Self, N)> {
        let (site, rest) = self.call_stack.pop()?;
        let site = site.clone();
        let mut scap = self.clone();
        scap.call_stack = rest;
        Some((scap, site))
    }

    /// Statements of the visited facts, source side first
    ///
    /// `None` when no path was recorded.
    pub fn statement_path(&self, facts: &FactArena<N>) -> Option<Vec<N>> {
        if self.path.is_empty() {
            return None;
        }
        Some(
            self.path
                .iter()
                .filter_map(|&id| facts[id].current_stmt().cloned())
                .collect(),
        )
    }
}

impl<N: Clone> Clone for SourceContextAndPath<N> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            path: self.path.clone(),
            call_stack: self.call_stack.clone(),
            neighbor_counter: AtomicUsize::new(self.neighbor_counter.load(Ordering::Acquire)),
            path_agnostic: self.path_agnostic,
        }
    }
}

// The neighbor counter is bookkeeping and never part of the identity.
impl<N: PartialEq> PartialEq for SourceContextAndPath<N> {
    fn eq(&self, other: &Self) -> bool {
        if self.sink != other.sink || self.call_stack != other.call_stack {
            return false;
        }
        self.path_agnostic || other.path_agnostic || self.path == other.path
    }
}

impl<N: Eq> Eq for SourceContextAndPath<N> {}

impl<N: Hash> Hash for SourceContextAndPath<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sink.hash(state);
        self.call_stack.hash(state);
        if !self.path_agnostic {
            self.path.hash(state);
        }
    }
}

impl<N: std::fmt::Debug> std::fmt::Debug for SourceContextAndPath<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceContextAndPath")
            .field("sink", &self.sink.definition)
            .field("stmt", &self.sink.stmt)
            .field("path_len", &self.path.len())
            .field("call_stack", &self.call_stack)
            .finish()
    }
}
