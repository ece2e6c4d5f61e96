//! Where propagated edges run: the shared pool or the current task

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::features::ifds::domain::PathEdge;

/// Kind of edge that produced a propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropagationKind {
    InitialSeed,
    Normal,
    Call,
    CallToReturn,
    Return,
}

/// Destination of a newly recorded path edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTarget {
    /// Submit a new task to the worker pool
    Executor,
    /// Append to the local worklist of the task that produced it
    Local,
}

/// Scheduling policy of the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingStrategy {
    /// Every edge becomes its own pool task
    #[default]
    EachEdgeIndividually,
    /// Normal and call-to-return edges stay with the producing task
    EachMethodIndividually,
    /// Everything a task produces stays with it
    AllEdgesLocally,
}

impl SchedulingStrategy {
    pub fn target_for(self, kind: PropagationKind) -> ScheduleTarget {
        match self {
            SchedulingStrategy::EachEdgeIndividually => ScheduleTarget::Executor,
            SchedulingStrategy::EachMethodIndividually => match kind {
                PropagationKind::Normal | PropagationKind::CallToReturn => ScheduleTarget::Local,
                PropagationKind::InitialSeed | PropagationKind::Call | PropagationKind::Return => {
                    ScheduleTarget::Executor
                }
            },
            SchedulingStrategy::AllEdgesLocally => match kind {
                PropagationKind::InitialSeed => ScheduleTarget::Executor,
                _ => ScheduleTarget::Local,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchedulingStrategy::EachEdgeIndividually => "each_edge_individually",
            SchedulingStrategy::EachMethodIndividually => "each_method_individually",
            SchedulingStrategy::AllEdgesLocally => "all_edges_locally",
        }
    }
}

impl fmt::Display for SchedulingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "each_edge_individually" | "each_edge" => Ok(Self::EachEdgeIndividually),
            "each_method_individually" | "each_method" => Ok(Self::EachMethodIndividually),
            "all_edges_locally" | "local" => Ok(Self::AllEdgesLocally),
            _ => Err(ConfigError::unknown_variant(
                "scheduling strategy",
                s,
                &["each_edge_individually", "each_method_individually", "all_edges_locally"],
            )),
        }
    }
}

/// Edges a running task keeps for itself
///
/// Owned by the task and passed down explicitly; drained before the task
/// returns.
#[derive(Debug)]
pub struct LocalWorklist<N> {
    edges: VecDeque<PathEdge<N>>,
}

impl<N> LocalWorklist<N> {
    pub fn new() -> Self {
        Self {
            edges: VecDeque::new(),
        }
    }

    pub fn push(&mut self, edge: PathEdge<N>) {
        self.edges.push_back(edge);
    }

    pub fn pop(&mut self) -> Option<PathEdge<N>> {
        self.edges.pop_front()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl<N> Default for LocalWorklist<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ifds::domain::FactArena;

    #[test]
    fn test_each_edge_always_pool() {
        let s = SchedulingStrategy::EachEdgeIndividually;
        for kind in [
            PropagationKind::InitialSeed,
            PropagationKind::Normal,
            PropagationKind::Call,
            PropagationKind::CallToReturn,
            PropagationKind::Return,
        ] {
            assert_eq!(s.target_for(kind), ScheduleTarget::Executor);
        }
    }

    #[test]
    fn test_each_method_keeps_intraprocedural_local() {
        let s = SchedulingStrategy::EachMethodIndividually;
        assert_eq!(s.target_for(PropagationKind::Normal), ScheduleTarget::Local);
        assert_eq!(s.target_for(PropagationKind::CallToReturn), ScheduleTarget::Local);
        assert_eq!(s.target_for(PropagationKind::Call), ScheduleTarget::Executor);
        assert_eq!(s.target_for(PropagationKind::Return), ScheduleTarget::Executor);
        assert_eq!(s.target_for(PropagationKind::InitialSeed), ScheduleTarget::Executor);
    }

    #[test]
    fn test_all_local_still_pools_seeds() {
        let s = SchedulingStrategy::AllEdgesLocally;
        assert_eq!(s.target_for(PropagationKind::InitialSeed), ScheduleTarget::Executor);
        assert_eq!(s.target_for(PropagationKind::Return), ScheduleTarget::Local);
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "each_method".parse::<SchedulingStrategy>().unwrap(),
            SchedulingStrategy::EachMethodIndividually
        );
        assert!("sometimes".parse::<SchedulingStrategy>().is_err());
    }

    #[test]
    fn test_local_worklist_fifo() {
        let arena: FactArena<&str> = FactArena::new();
        let zero = arena.zero();
        let mut wl = LocalWorklist::new();
        wl.push(PathEdge::new(zero, "a", zero));
        wl.push(PathEdge::new(zero, "b", zero));
        assert_eq!(wl.len(), 2);
        assert_eq!(wl.pop().map(|e| e.target), Some("a"));
        assert_eq!(wl.pop().map(|e| e.target), Some("b"));
        assert!(wl.is_empty());
    }
}
