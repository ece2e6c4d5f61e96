//! Initial seeds: facts injected at entry nodes before solving

use super::fact::FactId;

/// Entry node to seeded facts, in insertion order
#[derive(Debug, Clone)]
pub struct InitialSeeds<N> {
    entries: Vec<(N, Vec<FactId>)>,
}

impl<N: PartialEq> InitialSeeds<N> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Seed `facts` at `node` (merged with earlier seeds at the same node)
    pub fn with(mut self, node: N, facts: impl IntoIterator<Item = FactId>) -> Self {
        self.add(node, facts);
        self
    }

    pub fn add(&mut self, node: N, facts: impl IntoIterator<Item = FactId>) {
        match self.entries.iter_mut().find(|(n, _)| *n == node) {
            Some((_, existing)) => {
                for fact in facts {
                    if !existing.contains(&fact) {
                        existing.push(fact);
                    }
                }
            }
            None => {
                let mut list: Vec<FactId> = Vec::new();
                for fact in facts {
                    if !list.contains(&fact) {
                        list.push(fact);
                    }
                }
                self.entries.push((node, list));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, &[FactId])> {
        self.entries.iter().map(|(n, f)| (n, f.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of seeded (node, fact) pairs
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, f)| f.len()).sum()
    }
}

impl<N: PartialEq> Default for InitialSeeds<N> {
    fn default() -> Self {
        Self::new()
    }
}
