/*
 * IFDS Solver (summary-based tabulation, concurrent)
 *
 * Worklist fixed point over the exploded supergraph:
 * - Path edges (d1, n, d2) recorded once in the jump-function table
 * - End summaries (method, d1) -> {(exit, d2)} reused across call sites
 * - Incoming table replays summaries onto call sites registered later
 * - Equal facts reached through a second history become neighbors
 *
 * Resource bounds (all silently truncate):
 * - max neighbors per join point (call-site edges exempt)
 * - max callees per call site
 * - max abstraction path length
 *
 * References:
 * - Reps, Horwitz, Sagiv (1995): Precise Interprocedural Dataflow Analysis
 * - Naeem, Lhoták, Rodriguez (2010): Practical Extensions to the IFDS Algorithm
 */

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::executor::{InterruptableExecutor, QueueOrder};
use super::propagation_results::TaintPropagationResults;
use super::scheduling::{LocalWorklist, PropagationKind, ScheduleTarget};
use super::tables::{EndSummaryTable, IncomingSnapshot, IncomingTable, JumpFunctionTable};
use super::termination::{TerminationReason, TerminationState};
use crate::config::{PredecessorShorteningMode, SolverConfig, Validatable};
use crate::errors::Result;
use crate::features::ifds::context::AnalysisContext;
use crate::features::ifds::domain::{AccessPath, FactArena, FactId, FactKey, InitialSeeds, PathEdge};
use crate::features::ifds::ports::{
    FlowEdge, FlowFunctions, InterproceduralCfg, MemoryBoundedSolver, SolverStatusListener,
};
use crate::shared::GraphKey;

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_FINISHED: u8 = 2;

/// Counters collected during a run
#[derive(Debug, Default)]
pub struct SolverStats {
    propagations: AtomicU64,
    edges_processed: AtomicU64,
    neighbors_recorded: AtomicU64,
    neighbors_dropped: AtomicU64,
    summary_reuses: AtomicU64,
    unbalanced_returns: AtomicU64,
    pruned_by_path_length: AtomicU64,
    callees_skipped: AtomicU64,
}

/// Point-in-time copy of [`SolverStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverStatsSnapshot {
    /// Path edges scheduled for processing
    pub propagations: u64,
    pub edges_processed: u64,
    pub neighbors_recorded: u64,
    /// Neighbors not recorded because of the join-point cap
    pub neighbors_dropped: u64,
    /// Exit pairs applied from an existing end summary at a call site
    pub summary_reuses: u64,
    pub unbalanced_returns: u64,
    pub pruned_by_path_length: u64,
    /// Call sites not expanded because of the callee cap
    pub callees_skipped: u64,
}

impl SolverStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SolverStatsSnapshot {
        SolverStatsSnapshot {
            propagations: self.propagations.load(Ordering::Relaxed),
            edges_processed: self.edges_processed.load(Ordering::Relaxed),
            neighbors_recorded: self.neighbors_recorded.load(Ordering::Relaxed),
            neighbors_dropped: self.neighbors_dropped.load(Ordering::Relaxed),
            summary_reuses: self.summary_reuses.load(Ordering::Relaxed),
            unbalanced_returns: self.unbalanced_returns.load(Ordering::Relaxed),
            pruned_by_path_length: self.pruned_by_path_length.load(Ordering::Relaxed),
            callees_skipped: self.callees_skipped.load(Ordering::Relaxed),
        }
    }
}

/// What a call to [`IfdsSolver::solve`] produced
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// `None` when the fixed point was reached
    pub termination: Option<TerminationReason>,
    pub stats: SolverStatsSnapshot,
}

impl SolveOutcome {
    /// Whether the computed facts are the full fixed point
    pub fn is_complete(&self) -> bool {
        self.termination.is_none()
    }
}

struct SolverCore<N: GraphKey, M: GraphKey> {
    ctx: AnalysisContext<N, M>,
    flow_functions: Arc<dyn FlowFunctions<N, M>>,
    seeds: InitialSeeds<N>,
    config: SolverConfig,
    zero_key: FactKey<N>,
    jump_functions: JumpFunctionTable<N>,
    end_summary: EndSummaryTable<N, M>,
    incoming: IncomingTable<N, M>,
    executor: InterruptableExecutor,
    termination: TerminationState,
    state: AtomicU8,
    stats: SolverStats,
    results: OnceLock<Arc<TaintPropagationResults<N>>>,
}

/// Concurrent IFDS solver
///
/// Cheap to clone: clones share the same tables and executor, so one clone
/// can run [`solve`](Self::solve) while another calls
/// [`force_terminate`](MemoryBoundedSolver::force_terminate).
pub struct IfdsSolver<N: GraphKey, M: GraphKey> {
    core: Arc<SolverCore<N, M>>,
}

impl<N: GraphKey, M: GraphKey> Clone for IfdsSolver<N, M> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<N: GraphKey, M: GraphKey> IfdsSolver<N, M> {
    /// Validate `config` and create the worker pool
    pub fn new(
        ctx: AnalysisContext<N, M>,
        flow_functions: Arc<dyn FlowFunctions<N, M>>,
        seeds: InitialSeeds<N>,
        config: SolverConfig,
    ) -> Result<Self> {
        config.validate().inspect_err(|e| {
            warn!(config = config.config_name(), error = %e, "Rejected configuration");
        })?;
        let executor =
            InterruptableExecutor::new("ifds-solver", config.num_threads, QueueOrder::Fifo)?;
        let zero_key = ctx.facts().key(ctx.zero());
        Ok(Self {
            core: Arc::new(SolverCore {
                end_summary: EndSummaryTable::new(Arc::clone(&zero_key)),
                ctx,
                flow_functions,
                seeds,
                config,
                zero_key,
                jump_functions: JumpFunctionTable::new(),
                incoming: IncomingTable::new(),
                executor,
                termination: TerminationState::new(),
                state: AtomicU8::new(STATE_IDLE),
                stats: SolverStats::default(),
                results: OnceLock::new(),
            }),
        })
    }

    /// Watch `results` and stop the run when one of its listeners asks to
    pub fn attach_results(&self, results: Arc<TaintPropagationResults<N>>) -> bool {
        self.core.results.set(results).is_ok()
    }

    /// Seed the initial facts and run to a fixed point or until killed
    ///
    /// Early termination is not an error: it is reported in
    /// [`SolveOutcome::termination`] and the facts computed so far stay
    /// queryable. Only a panicking worker aborts the run with an error.
    pub fn solve(&self) -> Result<SolveOutcome> {
        let core = &self.core;
        core.termination.reset();
        core.executor.reset();
        core.state.store(STATE_RUNNING, Ordering::Release);

        let started = Instant::now();
        info!(
            seeds = core.seeds.len(),
            threads = core.executor.threads(),
            strategy = %core.config.scheduling_strategy,
            "IFDS solver started"
        );
        core.termination.notify_started(self);

        core.submit_initial_seeds();
        let drained = core.executor.await_completion();
        core.executor.shutdown();
        core.state.store(STATE_FINISHED, Ordering::Release);
        core.termination.notify_terminated(self);
        drained?;

        let stats = core.stats.snapshot();
        let termination = core.termination.reason();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &termination {
            Some(reason) => warn!(
                reason = %reason,
                elapsed_ms,
                jump_functions = core.jump_functions.len(),
                "IFDS solver terminated early"
            ),
            None => info!(
                elapsed_ms,
                propagations = stats.propagations,
                jump_functions = core.jump_functions.len(),
                end_summaries = core.end_summary.len(),
                neighbors = stats.neighbors_recorded,
                summary_reuses = stats.summary_reuses,
                "IFDS solver finished"
            ),
        }
        debug!(?stats, "IFDS solver statistics");
        Ok(SolveOutcome { termination, stats })
    }

    /// Insert an edge from outside a running task; always goes to the pool
    ///
    /// Seeds are never treated as unbalanced returns. To return into a
    /// caller context that was not recorded yet, use
    /// [`inject_context`](Self::inject_context).
    pub fn propagate(
        &self,
        source: FactId,
        target: N,
        target_fact: FactId,
        related_call_site: Option<N>,
    ) {
        self.core.propagate(
            source,
            target,
            target_fact,
            related_call_site.as_ref(),
            PropagationKind::InitialSeed,
            None,
        );
    }

    /// Register a call context discovered elsewhere and replay existing
    /// end summaries of `callee` onto it
    pub fn inject_context(&self, callee: M, d3: FactId, call_site: N, d2: FactId, d1: FactId) {
        let core = &self.core;
        if !core.add_incoming(&callee, d3, &call_site, d1, d2) {
            return;
        }
        let return_sites = core.icfg().return_sites_of_call_at(&call_site);
        core.apply_end_summary_on_call(d1, &call_site, d2, &return_sites, &callee, d3, None);
    }

    /// Drop the jump-function, end-summary and incoming tables
    pub fn cleanup(&self) {
        self.core.jump_functions.clear();
        self.core.end_summary.clear();
        self.core.incoming.clear();
    }

    /// Facts recorded at `node` under any entry fact
    pub fn facts_at(&self, node: &N) -> Vec<FactId> {
        self.core.jump_functions.facts_at(node)
    }

    /// Distinct non-zero access paths holding at `node`
    pub fn access_paths_at(&self, node: &N) -> BTreeSet<AccessPath> {
        let facts = self.core.ctx.facts();
        self.facts_at(node)
            .into_iter()
            .filter(|&f| !facts.is_zero(f))
            .map(|f| facts[f].access_path().clone())
            .collect()
    }

    pub fn end_summary(&self, method: &M, entry: FactId) -> Vec<(N, FactId)> {
        let key = self.core.ctx.facts().key(entry);
        self.core.end_summary.get(method, &key)
    }

    pub fn incoming(&self, method: &M, entry: FactId) -> IncomingSnapshot<N> {
        let key = self.core.ctx.facts().key(entry);
        self.core.incoming.get(method, &key)
    }

    pub fn jump_function_count(&self) -> usize {
        self.core.jump_functions.len()
    }

    pub fn propagation_count(&self) -> u64 {
        self.core.stats.propagations.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> SolverStatsSnapshot {
        self.core.stats.snapshot()
    }

    pub fn context(&self) -> &AnalysisContext<N, M> {
        &self.core.ctx
    }

    pub fn config(&self) -> &SolverConfig {
        &self.core.config
    }
}

impl<N: GraphKey, M: GraphKey> MemoryBoundedSolver for IfdsSolver<N, M> {
    fn force_terminate(&self, reason: TerminationReason) {
        self.core.kill(reason);
    }

    fn is_terminated(&self) -> bool {
        self.core.termination.is_killed()
            || self.core.state.load(Ordering::Acquire) == STATE_FINISHED
    }

    fn is_killed(&self) -> bool {
        self.core.termination.is_killed()
    }

    fn reset(&self) {
        self.core.termination.reset();
    }

    fn termination_reason(&self) -> Option<TerminationReason> {
        self.core.termination.reason()
    }

    fn add_status_listener(&self, listener: Arc<dyn SolverStatusListener>) {
        self.core.termination.add_listener(listener);
    }
}

impl<N: GraphKey, M: GraphKey> SolverCore<N, M> {
    fn icfg(&self) -> &dyn InterproceduralCfg<N, M> {
        self.ctx.icfg()
    }

    fn facts(&self) -> &FactArena<N> {
        self.ctx.facts()
    }

    fn zero(&self) -> FactId {
        self.ctx.zero()
    }

    fn kill(&self, reason: TerminationReason) {
        if self.termination.kill(reason.clone()) {
            warn!(reason = %reason, "IFDS solver killed");
        }
        self.executor.interrupt();
        self.executor.shutdown();
    }

    fn submit_initial_seeds(self: &Arc<Self>) {
        let zero = self.zero();
        for (start_point, facts) in self.seeds.iter() {
            for &fact in facts {
                self.propagate(
                    zero,
                    start_point.clone(),
                    fact,
                    None,
                    PropagationKind::InitialSeed,
                    None,
                );
            }
            self.jump_functions.add_function(
                Arc::clone(&self.zero_key),
                start_point.clone(),
                Arc::clone(&self.zero_key),
                zero,
            );
        }
    }

    /// The single insertion point for new path edges
    fn propagate(
        self: &Arc<Self>,
        source: FactId,
        target: N,
        target_fact: FactId,
        related_call_site: Option<&N>,
        kind: PropagationKind,
        local: Option<&mut LocalWorklist<N>>,
    ) {
        let facts = self.facts();
        if let Some(limit) = self.config.path_length_limit() {
            if facts[target_fact].path_length() > limit {
                SolverStats::bump(&self.stats.pruned_by_path_length);
                return;
            }
        }

        let existing = self.jump_functions.add_function(
            facts.key(source),
            target.clone(),
            facts.key(target_fact),
            target_fact,
        );
        match existing {
            Some(existing) if existing != target_fact => {
                let essential =
                    related_call_site.is_some_and(|site| self.icfg().is_call_stmt(site));
                let under_cap = self
                    .config
                    .join_point_limit()
                    .map_or(true, |cap| facts[existing].neighbor_count() < cap);
                if under_cap || essential {
                    if facts.add_neighbor(existing, target_fact) {
                        SolverStats::bump(&self.stats.neighbors_recorded);
                    }
                } else {
                    SolverStats::bump(&self.stats.neighbors_dropped);
                }
            }
            Some(_) => {}
            None => {
                crate::trace_edge!(
                    ?kind,
                    source = %facts[source].access_path(),
                    target = ?target,
                    fact = %facts[target_fact].access_path(),
                    "propagate"
                );
                self.schedule(PathEdge::new(source, target, target_fact), kind, local);
            }
        }
    }

    fn schedule(
        self: &Arc<Self>,
        edge: PathEdge<N>,
        kind: PropagationKind,
        local: Option<&mut LocalWorklist<N>>,
    ) {
        if self.termination.is_killed() {
            return;
        }
        match (self.config.scheduling_strategy.target_for(kind), local) {
            (ScheduleTarget::Local, Some(worklist)) => {
                SolverStats::bump(&self.stats.propagations);
                worklist.push(edge);
            }
            _ => {
                let core = Arc::clone(self);
                if self.executor.execute(move || core.run_task(edge)) {
                    SolverStats::bump(&self.stats.propagations);
                }
            }
        }
    }

    /// Process one edge, then everything it left on the local worklist
    fn run_task(self: &Arc<Self>, edge: PathEdge<N>) {
        let mut local = LocalWorklist::new();
        local.push(edge);
        while let Some(edge) = local.pop() {
            if self.termination.is_killed() {
                return;
            }
            self.process_edge(edge, &mut local);
            SolverStats::bump(&self.stats.edges_processed);
            self.check_results_listener();
        }
    }

    fn check_results_listener(&self) {
        if let Some(results) = self.results.get() {
            if results.stop_requested() && !self.termination.is_killed() {
                self.kill(TerminationReason::Requested(
                    "results listener requested stop".to_string(),
                ));
            }
        }
    }

    fn process_edge(self: &Arc<Self>, edge: PathEdge<N>, local: &mut LocalWorklist<N>) {
        let icfg = self.icfg();
        if icfg.is_call_stmt(&edge.target) {
            self.process_call(&edge, local);
        } else {
            // a statement may be both an exit and have successors (e.g. throw)
            if icfg.is_exit_stmt(&edge.target) {
                self.process_exit(&edge, local);
            }
            if !icfg.succs_of(&edge.target).is_empty() {
                self.process_normal_flow(&edge, local);
            }
        }
    }

    fn process_call(self: &Arc<Self>, edge: &PathEdge<N>, local: &mut LocalWorklist<N>) {
        let d1 = edge.source;
        let n = &edge.target;
        let d2 = edge.target_fact;
        let icfg = self.icfg();
        let return_sites = icfg.return_sites_of_call_at(n);
        let callees = icfg.callees_of_call_at(n);

        let within_cap = self
            .config
            .callee_limit()
            .map_or(true, |cap| callees.len() <= cap);
        if within_cap {
            for callee in callees.iter().filter(|m| icfg.is_concrete(m)) {
                if self.termination.is_killed() {
                    return;
                }
                let edge = FlowEdge::Call {
                    call_site: n,
                    callee,
                    entry_fact: d1,
                };
                let targets = self.flow_functions.compute_targets(edge, d2, self.facts());
                if targets.is_empty() {
                    continue;
                }
                let start_points = icfg.start_points_of(callee);
                for d3 in targets {
                    for sp in &start_points {
                        self.propagate(
                            d3,
                            sp.clone(),
                            d3,
                            Some(n),
                            PropagationKind::Call,
                            Some(&mut *local),
                        );
                    }
                    if !self.add_incoming(callee, d3, n, d1, d2) {
                        continue;
                    }
                    self.apply_end_summary_on_call(
                        d1,
                        n,
                        d2,
                        &return_sites,
                        callee,
                        d3,
                        Some(&mut *local),
                    );
                }
            }
        } else {
            SolverStats::bump(&self.stats.callees_skipped);
            debug!(call_site = ?n, callees = callees.len(), "Skipping call site over callee limit");
        }

        for return_site in &return_sites {
            let edge = FlowEdge::CallToReturn {
                call_site: n,
                return_site,
                entry_fact: d1,
            };
            for d3 in self.flow_functions.compute_targets(edge, d2, self.facts()) {
                self.propagate(
                    d1,
                    return_site.clone(),
                    d3,
                    Some(n),
                    PropagationKind::CallToReturn,
                    Some(&mut *local),
                );
            }
        }
    }

    fn add_incoming(&self, callee: &M, d3: FactId, call_site: &N, d1: FactId, d2: FactId) -> bool {
        let facts = self.facts();
        self.incoming.add(
            callee.clone(),
            facts.key(d3),
            call_site.clone(),
            facts.key(d1),
            d1,
            d2,
        )
    }

    fn apply_end_summary_on_call(
        self: &Arc<Self>,
        d1: FactId,
        n: &N,
        d2: FactId,
        return_sites: &[N],
        callee: &M,
        d3: FactId,
        mut local: Option<&mut LocalWorklist<N>>,
    ) {
        let summaries = self.end_summary.get(callee, &self.facts().key(d3));
        for (exit_stmt, d4) in summaries {
            SolverStats::bump(&self.stats.summary_reuses);
            for return_site in return_sites {
                let caller_facts = [d1];
                let edge = FlowEdge::Return {
                    call_site: Some(n),
                    callee,
                    exit_stmt: &exit_stmt,
                    return_site: Some(return_site),
                    callee_entry_fact: d3,
                    caller_facts: &caller_facts,
                };
                for d5 in self.flow_functions.compute_targets(edge, d4, self.facts()) {
                    let d5p = self.shorten_predecessors(d5, d2);
                    self.propagate(
                        d1,
                        return_site.clone(),
                        d5p,
                        Some(n),
                        PropagationKind::Return,
                        local.as_deref_mut(),
                    );
                }
            }
        }
    }

    fn process_exit(self: &Arc<Self>, edge: &PathEdge<N>, local: &mut LocalWorklist<N>) {
        let n = &edge.target;
        let d1 = edge.source;
        let d2 = edge.target_fact;
        let icfg = self.icfg();
        let Some(method) = icfg.method_of(n) else {
            debug!(node = ?n, "Exit statement without enclosing method");
            return;
        };

        let facts = self.facts();
        let d1_key = facts.key(d1);
        if !self
            .end_summary
            .add(method.clone(), Arc::clone(&d1_key), n.clone(), facts.key(d2), d2)
        {
            return;
        }

        let incoming = self.incoming.get(&method, &d1_key);
        for (call_site, contexts) in &incoming {
            if self.termination.is_killed() {
                return;
            }
            let caller_facts: Vec<FactId> = contexts.iter().map(|&(d4, _)| d4).collect();
            for return_site in icfg.return_sites_of_call_at(call_site) {
                let edge = FlowEdge::Return {
                    call_site: Some(call_site),
                    callee: &method,
                    exit_stmt: n,
                    return_site: Some(&return_site),
                    callee_entry_fact: d1,
                    caller_facts: &caller_facts,
                };
                let targets = self.flow_functions.compute_targets(edge, d2, facts);
                if targets.is_empty() {
                    continue;
                }
                for &(d4, pred) in contexts {
                    for &d5 in &targets {
                        let d5p = self.shorten_predecessors(d5, pred);
                        self.propagate(
                            d4,
                            return_site.clone(),
                            d5p,
                            Some(call_site),
                            PropagationKind::Return,
                            Some(&mut *local),
                        );
                    }
                }
            }
        }

        // Unbalanced return: only flows that originate from zero leave a
        // method nobody was seen calling under this entry fact
        if self.config.follow_returns_past_seeds && facts.is_zero(d1) && incoming.is_empty() {
            let zero = self.zero();
            let callers = icfg.callers_of(&method);
            for call_site in &callers {
                for return_site in icfg.return_sites_of_call_at(call_site) {
                    let caller_facts = [zero];
                    let edge = FlowEdge::Return {
                        call_site: Some(call_site),
                        callee: &method,
                        exit_stmt: n,
                        return_site: Some(&return_site),
                        callee_entry_fact: d1,
                        caller_facts: &caller_facts,
                    };
                    SolverStats::bump(&self.stats.unbalanced_returns);
                    for d5 in self.flow_functions.compute_targets(edge, d2, facts) {
                        self.propagate(
                            zero,
                            return_site.clone(),
                            d5,
                            Some(call_site),
                            PropagationKind::Return,
                            Some(&mut *local),
                        );
                    }
                }
            }
            if callers.is_empty() {
                // no caller at all: still run the exit flow for its side effects
                SolverStats::bump(&self.stats.unbalanced_returns);
                let edge = FlowEdge::Return {
                    call_site: None,
                    callee: &method,
                    exit_stmt: n,
                    return_site: None,
                    callee_entry_fact: d1,
                    caller_facts: &[],
                };
                // nowhere to return to, so the targets are dropped
                let _ = self.flow_functions.compute_targets(edge, d2, facts);
            }
        }
    }

    fn process_normal_flow(self: &Arc<Self>, edge: &PathEdge<N>, local: &mut LocalWorklist<N>) {
        let d1 = edge.source;
        let n = &edge.target;
        let d2 = edge.target_fact;
        for m in self.icfg().succs_of(n) {
            if self.termination.is_killed() {
                return;
            }
            let flow = FlowEdge::Normal {
                curr: n,
                succ: &m,
                entry_fact: d1,
            };
            for d3 in self.flow_functions.compute_targets(flow, d2, self.facts()) {
                self.propagate(
                    d1,
                    m.clone(),
                    d3,
                    None,
                    PropagationKind::Normal,
                    Some(&mut *local),
                );
            }
        }
    }

    /// Rewire a returned fact's predecessor to the caller-side fact
    fn shorten_predecessors(&self, d5: FactId, caller_fact: FactId) -> FactId {
        let facts = self.facts();
        match self.config.shortening_mode {
            PredecessorShorteningMode::NeverShorten => d5,
            PredecessorShorteningMode::ShortenIfEqual => {
                if facts.same_value(d5, caller_fact) {
                    caller_fact
                } else {
                    d5
                }
            }
            PredecessorShorteningMode::AlwaysShorten => {
                if d5 != caller_fact && facts[d5].predecessor() != Some(caller_fact) {
                    facts.derive_with_predecessor(d5, caller_fact)
                } else {
                    d5
                }
            }
        }
    }
}
