//! Flow-function provider
//!
//! One entry point, dispatched on [`FlowEdge`]: each variant carries exactly
//! the context its edge kind needs.

use crate::features::ifds::domain::{FactArena, FactId};

/// The supergraph edge a fact is pushed across
#[derive(Debug, Clone, Copy)]
pub enum FlowEdge<'a, N, M> {
    /// `curr -> succ` inside one method
    Normal {
        curr: &'a N,
        succ: &'a N,
        entry_fact: FactId,
    },
    /// Call site into the entry of `callee`
    Call {
        call_site: &'a N,
        callee: &'a M,
        entry_fact: FactId,
    },
    /// Call site to return site, bypassing the callee
    CallToReturn {
        call_site: &'a N,
        return_site: &'a N,
        entry_fact: FactId,
    },
    /// Exit of `callee` back to a return site
    ///
    /// `call_site` and `return_site` are `None` for an unbalanced return out
    /// of a method that has no caller at all.
    Return {
        call_site: Option<&'a N>,
        callee: &'a M,
        exit_stmt: &'a N,
        return_site: Option<&'a N>,
        callee_entry_fact: FactId,
        caller_facts: &'a [FactId],
    },
}

impl<N, M> FlowEdge<'_, N, M> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FlowEdge::Normal { .. } => "normal",
            FlowEdge::Call { .. } => "call",
            FlowEdge::CallToReturn { .. } => "call_to_return",
            FlowEdge::Return { .. } => "return",
        }
    }
}

/// Taint semantics plugged into the solver
///
/// Must be deterministic and must not touch solver state. New facts are
/// created through `facts` (see [`FactArena::derive`] and friends); returning
/// the incoming fact unchanged is the identity function.
pub trait FlowFunctions<N, M>: Send + Sync {
    fn compute_targets(
        &self,
        edge: FlowEdge<'_, N, M>,
        fact: FactId,
        facts: &FactArena<N>,
    ) -> Vec<FactId>;
}
