//! Test data builders
//!
//! Statement-level taint rules for [`RecordingTaint`](super::RecordingTaint)
//! and a helper for methods that are not straight lines.

use codegraph_ifds::features::ifds::IcfgEdge;
use codegraph_ifds::SimpleIcfg;

/// Taint rules keyed by statement name
///
/// Variables are access-path bases; facts are matched on their base only.
#[derive(Debug, Clone, Default)]
pub struct TaintRules {
    /// `(stmt, var)`: zero generates `var` when leaving `stmt`
    pub sources: Vec<(String, String)>,
    /// `(stmt, lhs, rhs)`: `lhs = rhs` at `stmt`
    pub assigns: Vec<(String, String, String)>,
    /// `(stmt, var)`: `var` leaving `stmt` is reported as a sink hit
    pub sinks: Vec<(String, String)>,
    /// `(call_site, arg, param)`
    pub args: Vec<(String, String, String)>,
    /// `(call_site, callee_var, lhs)`
    pub returns: Vec<(String, String, String)>,
    /// Statements whose flow function panics
    pub panics: Vec<String>,
}

impl TaintRules {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, stmt: &str, var: &str) -> Self {
        self.sources.push((stmt.to_string(), var.to_string()));
        self
    }

    pub fn with_assign(mut self, stmt: &str, lhs: &str, rhs: &str) -> Self {
        self.assigns
            .push((stmt.to_string(), lhs.to_string(), rhs.to_string()));
        self
    }

    pub fn with_sink(mut self, stmt: &str, var: &str) -> Self {
        self.sinks.push((stmt.to_string(), var.to_string()));
        self
    }

    /// Bind `arg` at `call_site` to the callee parameter `param`
    pub fn with_arg(mut self, call_site: &str, arg: &str, param: &str) -> Self {
        self.args
            .push((call_site.to_string(), arg.to_string(), param.to_string()));
        self
    }

    /// Assign the callee's `callee_var` to `lhs` on return to `call_site`
    pub fn with_return(mut self, call_site: &str, callee_var: &str, lhs: &str) -> Self {
        self.returns
            .push((call_site.to_string(), callee_var.to_string(), lhs.to_string()));
        self
    }

    pub fn with_panic(mut self, stmt: &str) -> Self {
        self.panics.push(stmt.to_string());
        self
    }
}

/// Add `method` built from explicit normal edges
pub fn add_branching_method(
    icfg: &mut SimpleIcfg,
    method: &str,
    entry: &str,
    exit: &str,
    edges: &[(&str, &str)],
) {
    for (from, to) in edges {
        icfg.add_node(method, from)
            .add_node(method, to)
            .add_edge(IcfgEdge::normal(from, to));
    }
    icfg.add_entry(method, entry).add_exit(method, exit);
}

/// Straight-line method `prefix0 -> prefix1 -> ... -> prefix{len-1}`
pub fn add_chain_method(icfg: &mut SimpleIcfg, method: &str, prefix: &str, len: usize) {
    let names: Vec<String> = (0..len).map(|i| format!("{prefix}{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    icfg.add_method(method, &refs);
}
