//! Test fixtures
//!
//! A rule-driven taint analysis that logs every flow-function invocation,
//! a harness wiring it to the solver, and the small programs the tests share.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use codegraph_ifds::features::ifds::infrastructure::Name;
use codegraph_ifds::{
    AbstractionAtSink, AbstractionPathBuilder, AccessPath, AnalysisContext, FactArena, FactId,
    FlowEdge, FlowFunctions, IfdsSolver, InitialSeeds, PathBuilderFactory, PathConfig,
    SimpleIcfg, SolveOutcome, SolverConfig, SourceContext, SourceSinkDefinition,
    TaintPropagationResults,
};

use super::builders::{add_branching_method, add_chain_method, TaintRules};

/// One flow-function invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowCall {
    pub kind: &'static str,
    /// `curr` for normal edges, the call site for call edges, the exit
    /// statement for returns
    pub node: String,
    pub fact: String,
    /// Set for call, call-to-return and balanced return edges
    pub call_site: Option<String>,
}

/// Flow functions interpreting [`TaintRules`]
pub struct RecordingTaint {
    rules: TaintRules,
    sinks: Arc<TaintPropagationResults<Name>>,
    delay: Option<Duration>,
    log: Mutex<Vec<FlowCall>>,
}

impl RecordingTaint {
    pub fn new(rules: TaintRules, sinks: Arc<TaintPropagationResults<Name>>) -> Self {
        Self {
            rules,
            sinks,
            delay: None,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Sleep on every normal edge
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<FlowCall> {
        self.log.lock().clone()
    }

    /// Invocations of `kind` at `node` for facts printing as `fact`
    pub fn invocations(&self, kind: &str, node: &str, fact: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|c| c.kind == kind && c.node == node && c.fact == fact)
            .count()
    }

    pub fn invocations_of_kind(&self, kind: &str) -> usize {
        self.log.lock().iter().filter(|c| c.kind == kind).count()
    }

    fn normal(&self, curr: &Name, fact: FactId, facts: &FactArena<Name>) -> Vec<FactId> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let stmt = &**curr;
        if facts.is_zero(fact) {
            let mut out = vec![fact];
            for (at, var) in &self.rules.sources {
                if at == stmt {
                    let ap = AccessPath::new(var.as_str());
                    let ctx = SourceContext::new(
                        SourceSinkDefinition::new("source"),
                        ap.clone(),
                        Arc::clone(curr),
                    );
                    out.push(facts.source(ap, ctx));
                }
            }
            return out;
        }

        let ap = facts[fact].access_path().clone();
        let base = ap.base().unwrap_or_default();
        for (at, var) in &self.rules.sinks {
            if at == stmt && var == base {
                self.sinks.add_result(AbstractionAtSink::new(
                    SourceSinkDefinition::new("sink"),
                    fact,
                    Arc::clone(curr),
                ));
            }
        }

        let mut out = Vec::new();
        let overwritten = self
            .rules
            .assigns
            .iter()
            .any(|(at, lhs, _)| at == stmt && lhs == base);
        if !overwritten {
            out.push(fact);
        }
        for (at, lhs, rhs) in &self.rules.assigns {
            if at == stmt && rhs == base {
                out.push(facts.derive(fact, ap.rebase(lhs.as_str()), Arc::clone(curr)));
            }
        }
        out
    }

    fn call(&self, call_site: &Name, fact: FactId, facts: &FactArena<Name>) -> Vec<FactId> {
        if facts.is_zero(fact) {
            return vec![fact];
        }
        let ap = facts[fact].access_path().clone();
        let base = ap.base().unwrap_or_default();
        self.rules
            .args
            .iter()
            .filter(|(at, arg, _)| at == &**call_site && arg == base)
            .map(|(_, _, param)| facts.derive(fact, ap.rebase(param.as_str()), Arc::clone(call_site)))
            .collect()
    }

    fn call_to_return(&self, call_site: &Name, fact: FactId, facts: &FactArena<Name>) -> Vec<FactId> {
        let base = facts[fact].access_path().base().unwrap_or_default();
        let assigned = self
            .rules
            .returns
            .iter()
            .any(|(at, _, lhs)| at == &**call_site && lhs == base);
        if assigned {
            vec![]
        } else {
            vec![fact]
        }
    }

    fn ret(
        &self,
        call_site: Option<&Name>,
        exit_stmt: &Name,
        fact: FactId,
        facts: &FactArena<Name>,
    ) -> Vec<FactId> {
        let Some(call_site) = call_site else {
            return vec![];
        };
        if facts.is_zero(fact) {
            return vec![];
        }
        let ap = facts[fact].access_path().clone();
        let base = ap.base().unwrap_or_default();
        self.rules
            .returns
            .iter()
            .filter(|(at, var, _)| at == &**call_site && var == base)
            .map(|(_, _, lhs)| {
                facts.derive_on_return(
                    fact,
                    ap.rebase(lhs.as_str()),
                    Arc::clone(exit_stmt),
                    Arc::clone(call_site),
                )
            })
            .collect()
    }
}

impl FlowFunctions<Name, Name> for RecordingTaint {
    fn compute_targets(
        &self,
        edge: FlowEdge<'_, Name, Name>,
        fact: FactId,
        facts: &FactArena<Name>,
    ) -> Vec<FactId> {
        let node = match edge {
            FlowEdge::Normal { curr, .. } => curr,
            FlowEdge::Call { call_site, .. } | FlowEdge::CallToReturn { call_site, .. } => call_site,
            FlowEdge::Return { exit_stmt, .. } => exit_stmt,
        };
        let call_site = match edge {
            FlowEdge::Normal { .. } => None,
            FlowEdge::Call { call_site, .. } | FlowEdge::CallToReturn { call_site, .. } => {
                Some(call_site)
            }
            FlowEdge::Return { call_site, .. } => call_site,
        };
        self.log.lock().push(FlowCall {
            kind: edge.kind_name(),
            node: node.to_string(),
            fact: facts[fact].access_path().to_string(),
            call_site: call_site.map(|c| c.to_string()),
        });
        if self.rules.panics.iter().any(|s| s == &**node) {
            panic!("flow function failed at {node}");
        }

        match edge {
            FlowEdge::Normal { curr, .. } => self.normal(curr, fact, facts),
            FlowEdge::Call { call_site, .. } => self.call(call_site, fact, facts),
            FlowEdge::CallToReturn { call_site, .. } => self.call_to_return(call_site, fact, facts),
            FlowEdge::Return {
                call_site,
                exit_stmt,
                ..
            } => self.ret(call_site, exit_stmt, fact, facts),
        }
    }
}

/// Solver, flow functions and sink collection of one test run
pub struct Analysis {
    pub ctx: AnalysisContext<Name, Name>,
    pub flows: Arc<RecordingTaint>,
    pub sinks: Arc<TaintPropagationResults<Name>>,
    pub solver: IfdsSolver<Name, Name>,
}

impl Analysis {
    /// Seed zero at `entry`
    pub fn new(icfg: SimpleIcfg, rules: TaintRules, entry: &str, config: SolverConfig) -> Self {
        Self::with_flows(icfg, entry, config, |sinks| RecordingTaint::new(rules, sinks))
    }

    pub fn with_flows(
        icfg: SimpleIcfg,
        entry: &str,
        config: SolverConfig,
        flows: impl FnOnce(Arc<TaintPropagationResults<Name>>) -> RecordingTaint,
    ) -> Self {
        let ctx: AnalysisContext<Name, Name> = AnalysisContext::new(Arc::new(icfg));
        let sinks = Arc::new(TaintPropagationResults::new(Arc::clone(ctx.facts())));
        let flows = Arc::new(flows(Arc::clone(&sinks)));
        let seeds = InitialSeeds::new().with(Arc::from(entry), [ctx.zero()]);
        let solver = IfdsSolver::new(ctx.clone(), flows.clone(), seeds, config)
            .expect("valid solver config");
        solver.attach_results(Arc::clone(&sinks));
        Self {
            ctx,
            flows,
            sinks,
            solver,
        }
    }

    pub fn solve(&self) -> SolveOutcome {
        self.solver.solve().expect("solver run")
    }

    /// Non-zero access paths at `node`, printed
    pub fn paths_at(&self, node: &str) -> BTreeSet<String> {
        self.solver
            .access_paths_at(&Arc::from(node))
            .into_iter()
            .map(|ap| ap.to_string())
            .collect()
    }

    /// Create the configured builder and run it over every sink hit
    pub fn build_paths(&self, config: PathConfig) -> Box<dyn AbstractionPathBuilder<Name>> {
        let builder = PathBuilderFactory::new(config)
            .create(self.ctx.clone())
            .expect("valid path config");
        builder
            .compute_taint_paths(&self.sinks.results())
            .expect("path reconstruction");
        builder
    }
}

/// Single-threaded solver configuration without pruning
pub fn unbounded_solver_config() -> SolverConfig {
    SolverConfig::default()
        .num_threads(1)
        .max_join_point_abstractions(-1)
        .max_callees_per_call_site(-1)
        .max_abstraction_path_length(-1)
}

/// `main` calls `id` twice: `a = id(x)` at `c1`, `b = id(z)` at `c2`,
/// and leaks `b` at `r2`
///
/// Both arguments reach `id` as the same parameter fact, so the second
/// arrival becomes a neighbor of the first.
pub fn two_call_sites() -> (SimpleIcfg, TaintRules) {
    let mut icfg = SimpleIcfg::new();
    icfg.add_method("main", &["m0", "c1", "r1", "c2", "r2", "m3"])
        .add_method("id", &["p0", "p1"])
        .add_call("c1", "id")
        .add_call("c2", "id");
    let rules = TaintRules::new()
        .with_source("m0", "x")
        .with_source("m0", "z")
        .with_arg("c1", "x", "p")
        .with_arg("c2", "z", "p")
        .with_return("c1", "p", "a")
        .with_return("c2", "p", "b")
        .with_sink("r2", "b");
    (icfg, rules)
}

/// Two branches taint `x` at different statements, copy it to `y` and join
/// at `j`, where `y` is leaked
pub fn two_sources_one_sink() -> (SimpleIcfg, TaintRules) {
    let mut icfg = SimpleIcfg::new();
    add_branching_method(
        &mut icfg,
        "main",
        "m0",
        "end",
        &[
            ("m0", "s0"),
            ("s0", "a1"),
            ("a1", "a2"),
            ("a2", "j"),
            ("s0", "b1"),
            ("b1", "b2"),
            ("b2", "j"),
            ("j", "end"),
        ],
    );
    let rules = TaintRules::new()
        .with_source("a1", "x")
        .with_source("b1", "x")
        .with_assign("a2", "y", "x")
        .with_assign("b2", "y", "x")
        .with_sink("j", "y");
    (icfg, rules)
}

/// `x` tainted once, copied to `y` on `branches` parallel paths that join
/// at `j`
pub fn diamond(branches: usize) -> (SimpleIcfg, TaintRules) {
    let mut edges: Vec<(String, String)> = vec![("m0".into(), "s0".into())];
    let mut rules = TaintRules::new().with_source("m0", "x");
    for i in 0..branches {
        let node = format!("br{i}");
        edges.push(("s0".into(), node.clone()));
        edges.push((node.clone(), "j".into()));
        rules = rules.with_assign(&node, "y", "x");
    }
    edges.push(("j".into(), "end".into()));
    let refs: Vec<(&str, &str)> = edges.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();

    let mut icfg = SimpleIcfg::new();
    add_branching_method(&mut icfg, "main", "m0", "end", &refs);
    (icfg, rules)
}

/// `A` calls `B` at `a1`; `B` taints `x` at its entry and returns it into
/// `y`, which `A` leaks at the return site `a2`
pub fn source_in_callee() -> (SimpleIcfg, TaintRules) {
    let mut icfg = SimpleIcfg::new();
    icfg.add_method("A", &["a0", "a1", "a2", "a3"])
        .add_method("B", &["b0", "b1"])
        .add_call("a1", "B");
    let rules = TaintRules::new()
        .with_source("b0", "x")
        .with_return("a1", "x", "y")
        .with_sink("a2", "y");
    (icfg, rules)
}

/// `x` tainted at `n0` and carried down a chain of `len` statements
pub fn long_chain(len: usize) -> (SimpleIcfg, TaintRules) {
    let mut icfg = SimpleIcfg::new();
    add_chain_method(&mut icfg, "main", "n", len);
    (icfg, TaintRules::new().with_source("n0", "x"))
}
