//! String-keyed interprocedural CFG built edge by edge
//!
//! Nodes and methods are `Arc<str>` names. Useful for tests, benchmarks and
//! embedders that already hold a flat CFG.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::features::ifds::ports::InterproceduralCfg;

/// Node or method name
pub type Name = Arc<str>;

/// ICFG edge kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IcfgEdgeKind {
    /// Intraprocedural edge
    Normal,

    /// Call site to a callee method
    Call { callee: Name },

    /// Call site to one of its return sites
    CallToReturn,
}

/// ICFG edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IcfgEdge {
    pub from: Name,
    pub to: Name,
    pub kind: IcfgEdgeKind,
}

impl IcfgEdge {
    pub fn normal(from: &str, to: &str) -> Self {
        Self {
            from: Arc::from(from),
            to: Arc::from(to),
            kind: IcfgEdgeKind::Normal,
        }
    }

    /// `to` is the callee method name
    pub fn call(call_site: &str, callee: &str) -> Self {
        let callee: Name = Arc::from(callee);
        Self {
            from: Arc::from(call_site),
            to: Arc::clone(&callee),
            kind: IcfgEdgeKind::Call { callee },
        }
    }

    pub fn call_to_return(call_site: &str, return_site: &str) -> Self {
        Self {
            from: Arc::from(call_site),
            to: Arc::from(return_site),
            kind: IcfgEdgeKind::CallToReturn,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MethodInfo {
    nodes: Vec<Name>,
    start_points: Vec<Name>,
    end_points: Vec<Name>,
}

/// In-memory [`InterproceduralCfg`] with insertion-ordered adjacency
#[derive(Debug, Clone, Default)]
pub struct SimpleIcfg {
    /// All edges in insertion order
    pub edges: Vec<IcfgEdge>,
    methods: FxHashMap<Name, MethodInfo>,
    method_of: FxHashMap<Name, Name>,
    successors: FxHashMap<Name, Vec<Name>>,
    callees: FxHashMap<Name, Vec<Name>>,
    return_sites: FxHashMap<Name, Vec<Name>>,
    callers: FxHashMap<Name, Vec<Name>>,
    non_concrete: FxHashSet<Name>,
}

fn push_unique(list: &mut Vec<Name>, item: Name) {
    if !list.contains(&item) {
        list.push(item);
    }
}

impl SimpleIcfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a straight-line method: first node is the entry, last the exit
    pub fn add_method(&mut self, method: &str, nodes: &[&str]) -> &mut Self {
        for node in nodes {
            self.add_node(method, node);
        }
        for pair in nodes.windows(2) {
            self.add_edge(IcfgEdge::normal(pair[0], pair[1]));
        }
        if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
            self.add_entry(method, first);
            self.add_exit(method, last);
        }
        self
    }

    /// Attach `node` to `method`
    pub fn add_node(&mut self, method: &str, node: &str) -> &mut Self {
        let method: Name = Arc::from(method);
        let node: Name = Arc::from(node);
        let info = self.methods.entry(Arc::clone(&method)).or_default();
        push_unique(&mut info.nodes, Arc::clone(&node));
        self.method_of.insert(node, method);
        self
    }

    pub fn add_entry(&mut self, method: &str, node: &str) -> &mut Self {
        self.add_node(method, node);
        if let Some(info) = self.methods.get_mut(method) {
            push_unique(&mut info.start_points, Arc::from(node));
        }
        self
    }

    pub fn add_exit(&mut self, method: &str, node: &str) -> &mut Self {
        self.add_node(method, node);
        if let Some(info) = self.methods.get_mut(method) {
            push_unique(&mut info.end_points, Arc::from(node));
        }
        self
    }

    /// Add edge to the ICFG
    pub fn add_edge(&mut self, edge: IcfgEdge) -> &mut Self {
        match &edge.kind {
            IcfgEdgeKind::Normal => {
                push_unique(
                    self.successors.entry(Arc::clone(&edge.from)).or_default(),
                    Arc::clone(&edge.to),
                );
            }
            IcfgEdgeKind::Call { callee } => {
                push_unique(
                    self.callees.entry(Arc::clone(&edge.from)).or_default(),
                    Arc::clone(callee),
                );
                push_unique(
                    self.callers.entry(Arc::clone(callee)).or_default(),
                    Arc::clone(&edge.from),
                );
            }
            IcfgEdgeKind::CallToReturn => {
                push_unique(
                    self.return_sites.entry(Arc::clone(&edge.from)).or_default(),
                    Arc::clone(&edge.to),
                );
            }
        }
        self.edges.push(edge);
        self
    }

    /// Shorthand for [`IcfgEdge::call`]
    pub fn add_call(&mut self, call_site: &str, callee: &str) -> &mut Self {
        self.add_edge(IcfgEdge::call(call_site, callee))
    }

    /// Treat `method` as having no analyzable body
    pub fn mark_non_concrete(&mut self, method: &str) -> &mut Self {
        self.non_concrete.insert(Arc::from(method));
        self
    }

    pub fn get_successors(&self, node: &str) -> &[Name] {
        self.successors.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.method_of.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Nodes of `method` in insertion order
    pub fn nodes_of(&self, method: &str) -> Vec<Name> {
        self.methods
            .get(method)
            .map(|m| m.nodes.clone())
            .unwrap_or_default()
    }
}

impl InterproceduralCfg<Name, Name> for SimpleIcfg {
    fn succs_of(&self, node: &Name) -> Vec<Name> {
        self.get_successors(node).to_vec()
    }

    fn is_call_stmt(&self, node: &Name) -> bool {
        self.callees.get(node).is_some_and(|c| !c.is_empty())
    }

    fn is_exit_stmt(&self, node: &Name) -> bool {
        self.method_of
            .get(node)
            .and_then(|m| self.methods.get(m))
            .is_some_and(|info| info.end_points.contains(node))
    }

    fn callees_of_call_at(&self, node: &Name) -> Vec<Name> {
        self.callees.get(node).cloned().unwrap_or_default()
    }

    /// Explicit call-to-return edges, else the intraprocedural successors
    fn return_sites_of_call_at(&self, node: &Name) -> Vec<Name> {
        match self.return_sites.get(node) {
            Some(sites) if !sites.is_empty() => sites.clone(),
            _ => self.succs_of(node),
        }
    }

    fn start_points_of(&self, method: &Name) -> Vec<Name> {
        self.methods
            .get(method)
            .map(|m| m.start_points.clone())
            .unwrap_or_default()
    }

    fn callers_of(&self, method: &Name) -> Vec<Name> {
        self.callers.get(method).cloned().unwrap_or_default()
    }

    fn end_points_of(&self, method: &Name) -> Vec<Name> {
        self.methods
            .get(method)
            .map(|m| m.end_points.clone())
            .unwrap_or_default()
    }

    fn method_of(&self, node: &Name) -> Option<Name> {
        self.method_of.get(node).cloned()
    }

    fn is_concrete(&self, method: &Name) -> bool {
        self.methods.contains_key(method) && !self.non_concrete.contains(method)
    }
}
