//! Explicit analysis handle passed to the solver and path builders

use std::sync::Arc;

use super::domain::{FactArena, FactId};
use super::ports::InterproceduralCfg;
use crate::shared::GraphKey;

/// Program graph plus the fact arena of one analysis run
///
/// Cheap to clone; every component of a run holds the same handle.
pub struct AnalysisContext<N, M> {
    icfg: Arc<dyn InterproceduralCfg<N, M>>,
    facts: Arc<FactArena<N>>,
}

impl<N: GraphKey, M: GraphKey> AnalysisContext<N, M> {
    /// Context with a fresh fact arena
    pub fn new(icfg: Arc<dyn InterproceduralCfg<N, M>>) -> Self {
        Self::with_arena(icfg, Arc::new(FactArena::new()))
    }

    pub fn with_arena(icfg: Arc<dyn InterproceduralCfg<N, M>>, facts: Arc<FactArena<N>>) -> Self {
        Self { icfg, facts }
    }

    pub fn icfg(&self) -> &dyn InterproceduralCfg<N, M> {
        self.icfg.as_ref()
    }

    pub fn facts(&self) -> &Arc<FactArena<N>> {
        &self.facts
    }

    pub fn zero(&self) -> FactId {
        self.facts.zero()
    }
}

impl<N, M> Clone for AnalysisContext<N, M> {
    fn clone(&self) -> Self {
        Self {
            icfg: Arc::clone(&self.icfg),
            facts: Arc::clone(&self.facts),
        }
    }
}
