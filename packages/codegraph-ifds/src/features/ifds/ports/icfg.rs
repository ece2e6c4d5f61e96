//! Interprocedural control-flow graph provider

use crate::shared::GraphKey;

/// Read-only view of the program's interprocedural CFG
///
/// The solver expands successors, callees and callers in the order returned
/// here; implementations that return them in a stable order make solver runs
/// reproducible.
pub trait InterproceduralCfg<N: GraphKey, M: GraphKey>: Send + Sync {
    /// Intraprocedural successors of `node`
    fn succs_of(&self, node: &N) -> Vec<N>;

    fn is_call_stmt(&self, node: &N) -> bool;

    fn is_exit_stmt(&self, node: &N) -> bool;

    /// Possible targets of the call at `node`
    fn callees_of_call_at(&self, node: &N) -> Vec<M>;

    /// Nodes control returns to after the call at `node`
    fn return_sites_of_call_at(&self, node: &N) -> Vec<N>;

    fn start_points_of(&self, method: &M) -> Vec<N>;

    /// Call sites that may invoke `method`
    fn callers_of(&self, method: &M) -> Vec<N>;

    fn end_points_of(&self, method: &M) -> Vec<N>;

    fn method_of(&self, node: &N) -> Option<M>;

    /// Whether `method` has a body worth descending into
    fn is_concrete(&self, _method: &M) -> bool {
        true
    }
}
