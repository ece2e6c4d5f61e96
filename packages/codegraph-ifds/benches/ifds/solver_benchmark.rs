//! IFDS Performance Benchmark
//!
//! Measures performance of:
//! - Tabulation on straight-line and call-heavy programs
//! - Neighbor merging on diamond ladders
//! - Path reconstruction per builder algorithm
//!
//! Run with:
//! ```bash
//! cargo bench --bench ifds_benchmark
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use codegraph_ifds::features::ifds::infrastructure::Name;
use codegraph_ifds::features::ifds::IcfgEdge;
use codegraph_ifds::{
    AbstractionAtSink, AccessPath, AnalysisContext, FactArena, FactId, FlowEdge, FlowFunctions,
    IfdsSolver, InitialSeeds, PathBuilderFactory, PathBuildingAlgorithm, PathConfig,
    SimpleIcfg, SolverConfig, SourceContext, SourceSinkDefinition, TaintPropagationResults,
};

/// Taints `x` at the entry, copies facts through branch statements and
/// reports every fact reaching the sink
struct LadderTaint {
    source_at: Name,
    sink_at: Name,
    sinks: Arc<TaintPropagationResults<Name>>,
}

impl FlowFunctions<Name, Name> for LadderTaint {
    fn compute_targets(
        &self,
        edge: FlowEdge<'_, Name, Name>,
        fact: FactId,
        facts: &FactArena<Name>,
    ) -> Vec<FactId> {
        match edge {
            FlowEdge::Normal { curr, .. } => {
                if facts.is_zero(fact) {
                    if curr != &self.source_at {
                        return vec![fact];
                    }
                    let ap = AccessPath::new("x");
                    let ctx = SourceContext::new(
                        SourceSinkDefinition::new("bench_source"),
                        ap.clone(),
                        Arc::clone(curr),
                    );
                    return vec![fact, facts.source(ap, ctx)];
                }
                if curr == &self.sink_at {
                    self.sinks.add_result(AbstractionAtSink::new(
                        SourceSinkDefinition::new("bench_sink"),
                        fact,
                        Arc::clone(curr),
                    ));
                }
                if curr.ends_with('a') || curr.ends_with('b') {
                    vec![facts.derive_at(fact, Arc::clone(curr), None)]
                } else {
                    vec![fact]
                }
            }
            FlowEdge::Call { call_site, .. } => {
                if facts.is_zero(fact) {
                    return vec![fact];
                }
                vec![facts.derive_at(fact, Arc::clone(call_site), None)]
            }
            FlowEdge::CallToReturn { .. } => vec![fact],
            FlowEdge::Return {
                call_site: Some(call_site),
                exit_stmt,
                ..
            } if !facts.is_zero(fact) => {
                let ap = facts[fact].access_path().clone();
                vec![facts.derive_on_return(fact, ap, Arc::clone(exit_stmt), Arc::clone(call_site))]
            }
            FlowEdge::Return { .. } => vec![],
        }
    }
}

/// `k` diamonds in a row: `d{i}s -> d{i}a|d{i}b -> d{i}j -> d{i+1}s`
fn diamond_ladder(k: usize) -> (SimpleIcfg, Name, Name) {
    let mut icfg = SimpleIcfg::new();
    icfg.add_node("main", "entry").add_node("main", "exit");
    icfg.add_edge(IcfgEdge::normal("entry", "d0s"));
    for i in 0..k {
        let (s, a, b, j) = (
            format!("d{i}s"),
            format!("d{i}a"),
            format!("d{i}b"),
            format!("d{i}j"),
        );
        let next = if i + 1 == k {
            "exit".to_string()
        } else {
            format!("d{}s", i + 1)
        };
        for (from, to) in [(&s, &a), (&s, &b), (&a, &j), (&b, &j), (&j, &next)] {
            icfg.add_node("main", from)
                .add_node("main", to)
                .add_edge(IcfgEdge::normal(from, to));
        }
    }
    icfg.add_entry("main", "entry").add_exit("main", "exit");
    let last = format!("d{}j", k - 1);
    (icfg, Arc::from("entry"), Arc::from(last.as_str()))
}

/// Straight-line `main` where every fourth statement calls `helper`
fn call_chain(len: usize) -> (SimpleIcfg, Name, Name) {
    let names: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut icfg = SimpleIcfg::new();
    icfg.add_method("main", &refs)
        .add_method("helper", &["h0", "h1", "h2"]);
    for site in names.iter().skip(1).step_by(4) {
        if site != &names[len - 1] {
            icfg.add_call(site, "helper");
        }
    }
    (icfg, Arc::from("n0"), Arc::from(names[len - 2].as_str()))
}

struct Prepared {
    ctx: AnalysisContext<Name, Name>,
    sinks: Arc<TaintPropagationResults<Name>>,
    solver: IfdsSolver<Name, Name>,
}

fn prepare(program: (SimpleIcfg, Name, Name), threads: usize) -> Prepared {
    let (icfg, entry, sink_at) = program;
    let ctx: AnalysisContext<Name, Name> = AnalysisContext::new(Arc::new(icfg));
    let sinks = Arc::new(TaintPropagationResults::new(Arc::clone(ctx.facts())));
    let flows = Arc::new(LadderTaint {
        source_at: Arc::clone(&entry),
        sink_at,
        sinks: Arc::clone(&sinks),
    });
    let seeds = InitialSeeds::new().with(entry, [ctx.zero()]);
    let config = SolverConfig::default()
        .num_threads(threads)
        .max_join_point_abstractions(-1)
        .max_abstraction_path_length(-1);
    let solver = IfdsSolver::new(ctx.clone(), flows, seeds, config).expect("valid config");
    solver.attach_results(Arc::clone(&sinks));
    Prepared { ctx, sinks, solver }
}

fn bench_solver_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ifds_call_chain");
    group.sample_size(20);

    for len in [100, 1000] {
        for threads in [1, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("threads_{threads}"), len),
                &len,
                |b, &len| {
                    b.iter(|| {
                        let run = prepare(call_chain(len), threads);
                        black_box(run.solver.solve().expect("solve"));
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_solver_diamonds(c: &mut Criterion) {
    let mut group = c.benchmark_group("ifds_diamond_ladder");
    group.sample_size(20);

    for k in [50, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| {
                let run = prepare(diamond_ladder(k), 4);
                let outcome = run.solver.solve().expect("solve");
                black_box(outcome.stats.neighbors_recorded);
            });
        });
    }

    group.finish();
}

fn bench_path_builders(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_reconstruction");
    group.sample_size(20);

    let run = prepare(diamond_ladder(12), 4);
    run.solver.solve().expect("solve");
    let sinks = run.sinks.results();

    for algorithm in [
        PathBuildingAlgorithm::ContextSensitive,
        PathBuildingAlgorithm::ContextInsensitive,
        PathBuildingAlgorithm::ContextInsensitiveSourceFinder,
    ] {
        let config = PathConfig::default()
            .path_building_algorithm(algorithm)
            .num_threads(4);
        group.bench_function(format!("{algorithm:?}"), |b| {
            b.iter(|| {
                let builder = PathBuilderFactory::new(config.clone())
                    .create(run.ctx.clone())
                    .expect("valid config");
                builder.compute_taint_paths(&sinks).expect("paths");
                black_box(builder.results().len());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_solver_chain,
    bench_solver_diamonds,
    bench_path_builders
);
criterion_main!(benches);
