//! Path edges: a fact reaching a node under a method-entry fact

use super::fact::FactId;

/// `(d1, n, d2)`: `target_fact` holds at `target` when the enclosing method
/// was entered with `source`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEdge<N> {
    pub source: FactId,
    pub target: N,
    pub target_fact: FactId,
}

impl<N> PathEdge<N> {
    pub fn new(source: FactId, target: N, target_fact: FactId) -> Self {
        Self {
            source,
            target,
            target_fact,
        }
    }
}
