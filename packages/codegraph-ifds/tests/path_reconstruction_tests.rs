//! Path reconstruction integration tests
//!
//! The solver runs first; the builders then walk the resulting fact graph
//! backwards from every sink hit.

mod common;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use codegraph_ifds::features::ifds::infrastructure::Name;
use codegraph_ifds::features::path_reconstruction::ContextSensitivePathBuilder;
use codegraph_ifds::{
    AbstractionPathBuilder, AccessPath, MemoryBoundedSolver, PathBuilderFactory, PathBuildingAlgorithm, PathConfig,
    PathReconstructionMode, PathResultListener, ResultRecord, SimpleIcfg, SourceContext, SourceSinkDefinition,
};
use common::*;
use pretty_assertions::assert_eq;

fn paths(algorithm: PathBuildingAlgorithm) -> PathConfig {
    PathConfig::default()
        .path_building_algorithm(algorithm)
        .num_threads(2)
}

fn precise(algorithm: PathBuildingAlgorithm) -> PathConfig {
    paths(algorithm)
        .path_reconstruction_mode(PathReconstructionMode::Precise)
        .path_agnostic_results(false)
}

fn names(stmts: &[&str]) -> Vec<Name> {
    stmts.iter().map(|s| Arc::from(*s)).collect()
}

fn solved(scenario: (SimpleIcfg, TaintRules), entry: &str) -> Analysis {
    let (icfg, rules) = scenario;
    let analysis = Analysis::new(icfg, rules, entry, unbounded_solver_config());
    assert_complete(&analysis.solve());
    analysis
}

#[test]
fn test_context_sensitive_rejects_unrealizable_return() {
    let analysis = solved(two_call_sites(), "m0");
    let builder = analysis.build_paths(paths(PathBuildingAlgorithm::ContextSensitive));

    // `x` only reaches `b` by entering `id` at c1 and leaving it at c2
    assert_sources(&builder.results(), &["z"]);
    assert!(builder.is_terminated());
    assert!(!builder.is_killed());
    assert_eq!(builder.termination_reason(), None);
}

#[test]
fn test_context_insensitive_accepts_every_history() {
    let analysis = solved(two_call_sites(), "m0");
    let builder = analysis.build_paths(paths(PathBuildingAlgorithm::ContextInsensitive));

    assert_sources(&builder.results(), &["x", "z"]);
}

#[test]
fn test_source_finder_reports_connections_without_paths() {
    let analysis = solved(two_call_sites(), "m0");
    let builder =
        analysis.build_paths(paths(PathBuildingAlgorithm::ContextInsensitiveSourceFinder));

    let results = builder.results();
    assert_sources(&results, &["x", "z"]);
    assert!(results.results().iter().all(|r| r.path.is_none()));
}

#[test]
fn test_disabled_reconstruction_reports_nothing() {
    let analysis = solved(two_call_sites(), "m0");
    let builder = analysis.build_paths(paths(PathBuildingAlgorithm::None));

    assert!(builder.results().is_empty());
    assert!(builder.is_terminated());
}

#[test]
fn test_source_in_callee_reaches_caller_sink() {
    let analysis = solved(source_in_callee(), "a0");
    assert_eq!(analysis.sinks.len(), 1);

    let builder = analysis.build_paths(paths(PathBuildingAlgorithm::ContextSensitive));
    let results = builder.results().results();
    assert_eq!(results.len(), 1);

    let record = &results[0];
    assert_eq!(record.source_definition, SourceSinkDefinition::new("source"));
    assert_eq!(record.sink_definition, SourceSinkDefinition::new("sink"));
    assert_eq!(record.source_access_path, AccessPath::new("x"));
    assert_eq!(record.sink_access_path, AccessPath::new("y"));
    assert_eq!(&*record.source_stmt, "b0");
    assert_eq!(&*record.sink_stmt, "a2");
    assert_eq!(record.path, None);
}

#[test]
fn test_precise_path_lists_statements_from_source_to_sink() {
    let analysis = solved(source_in_callee(), "a0");
    let builder = analysis.build_paths(precise(PathBuildingAlgorithm::ContextSensitive));

    let results = builder.results().results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, Some(names(&["b0", "b1", "a2"])));
}

#[test]
fn test_precise_path_follows_matching_neighbor() {
    let analysis = solved(two_call_sites(), "m0");
    let builder = analysis.build_paths(precise(PathBuildingAlgorithm::ContextSensitive));

    let results = builder.results().results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, Some(names(&["m0", "c2", "p1", "r2"])));
}

#[test]
fn test_max_path_length_discards_long_paths() {
    let analysis = solved(source_in_callee(), "a0");

    let short = analysis.build_paths(
        precise(PathBuildingAlgorithm::ContextSensitive).max_path_length(2),
    );
    assert!(short.results().is_empty());

    let enough = analysis.build_paths(
        precise(PathBuildingAlgorithm::ContextSensitive).max_path_length(3),
    );
    assert_eq!(enough.results().len(), 1);
}

#[test]
fn test_neighbors_yield_one_result_per_source() {
    let analysis = solved(two_sources_one_sink(), "m0");
    assert_eq!(analysis.sinks.len(), 1);

    for algorithm in [
        PathBuildingAlgorithm::ContextSensitive,
        PathBuildingAlgorithm::ContextInsensitive,
        PathBuildingAlgorithm::ContextInsensitiveSourceFinder,
    ] {
        let builder = analysis.build_paths(paths(algorithm));
        let results = builder.results();
        assert_eq!(results.len(), 2, "{algorithm:?}");
        assert_eq!(
            source_stmts(&results),
            BTreeSet::from(["a1".to_string(), "b1".to_string()]),
            "{algorithm:?}"
        );
    }
}

#[test]
fn test_path_agnostic_results_merge_equal_connections() {
    let analysis = solved(two_sources_one_sink(), "m0");

    let agnostic = analysis.build_paths(
        paths(PathBuildingAlgorithm::ContextSensitive)
            .path_reconstruction_mode(PathReconstructionMode::Precise),
    );
    assert!(agnostic.results().is_path_agnostic());
    assert_eq!(agnostic.results().len(), 2);

    let from_a1 = agnostic.results().from_source(&Arc::from("a1"));
    assert_eq!(from_a1.len(), 1);
    assert_eq!(from_a1[0].path, Some(names(&["a1", "a2", "j"])));
}

#[test]
fn test_batches_cover_every_sink() {
    let (icfg, rules) = long_chain(6);
    let rules = rules
        .with_sink("n1", "x")
        .with_sink("n2", "x")
        .with_sink("n3", "x");
    let analysis = solved((icfg, rules), "n0");
    assert_eq!(analysis.sinks.len(), 3);

    let builder = analysis.build_paths(paths(PathBuildingAlgorithm::ContextSensitive).batch_size(1));
    let results = builder.results();
    assert_eq!(results.len(), 3);
    for stmt in ["n1", "n2", "n3"] {
        assert_eq!(results.at_sink(&Arc::from(stmt)).len(), 1, "sink {stmt}");
    }
}

struct CountingHandler {
    seen: AtomicUsize,
}

impl PathResultListener<Name> for CountingHandler {
    fn on_result_available(&self, _result: &ResultRecord<Name>) {
        self.seen.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_handlers_see_each_new_result_once() {
    let analysis = solved(two_sources_one_sink(), "m0");
    let builder = PathBuilderFactory::new(paths(PathBuildingAlgorithm::ContextSensitive))
        .create(analysis.ctx.clone())
        .unwrap();
    let handler = Arc::new(CountingHandler {
        seen: AtomicUsize::new(0),
    });
    builder.add_result_available_handler(handler.clone());

    builder.compute_taint_paths(&analysis.sinks.results()).unwrap();
    builder.compute_taint_paths(&analysis.sinks.results()).unwrap();

    assert_eq!(builder.results().len(), 2);
    assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_incremental_run_follows_new_neighbors() {
    let analysis = solved(source_in_callee(), "a0");
    let builder = ContextSensitivePathBuilder::new(
        analysis.ctx.clone(),
        paths(PathBuildingAlgorithm::ContextSensitive),
    )
    .unwrap();
    let sinks = analysis.sinks.results();
    builder.compute_taint_paths(&sinks).unwrap();
    assert_eq!(builder.results().len(), 1);
    assert!(builder.cached_fact_count() > 0);

    // nothing changed: nothing to do
    builder.run_incremental_path_computation().unwrap();
    assert_eq!(builder.results().len(), 1);

    let facts = analysis.ctx.facts();
    let late = facts.source(
        AccessPath::new("w"),
        SourceContext::new(SourceSinkDefinition::new("source"), AccessPath::new("w"), Arc::from("a0")),
    );
    assert!(facts.add_neighbor(sinks[0].fact, late));

    builder.run_incremental_path_computation().unwrap();
    let results = builder.results();
    assert_eq!(results.len(), 2);
    assert_eq!(results.from_source(&Arc::from("a0")).len(), 1);
}

#[test]
fn test_source_finder_reuses_path_flags_across_runs() {
    let analysis = solved(two_sources_one_sink(), "m0");
    let builder = PathBuilderFactory::new(paths(PathBuildingAlgorithm::ContextInsensitiveSourceFinder))
        .create(analysis.ctx.clone())
        .unwrap();
    let sinks = analysis.sinks.results();
    assert!(!sinks.is_empty());

    // well past 64 tasks in total
    for _ in 0..100 {
        builder.compute_taint_paths(&sinks).unwrap();
    }

    let results = builder.results();
    assert_eq!(results.len(), 2);
    assert_eq!(
        source_stmts(&results),
        BTreeSet::from(["a1".to_string(), "b1".to_string()])
    );
    let widest = analysis
        .ctx
        .facts()
        .iter()
        .map(|(_, fact)| fact.path_flag_words())
        .max()
        .unwrap_or_default();
    assert!(widest <= 1, "path flags grew to {widest} words");
}
