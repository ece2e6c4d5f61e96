//! Custom assertions for test verification
//!
//! Domain-specific checks over solver outcomes and reconstructed results.

use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

use codegraph_ifds::features::ifds::infrastructure::Name;
use codegraph_ifds::{InfoflowResults, SolveOutcome};

use super::fixtures::Analysis;

/// Assert that the solver reached its fixed point
pub fn assert_complete(outcome: &SolveOutcome) {
    assert!(
        outcome.is_complete(),
        "Expected a complete run, terminated with: {:?}",
        outcome.termination
    );
}

/// Assert the exact set of access paths holding at `node`
pub fn assert_paths_at(analysis: &Analysis, node: &str, expected: &[&str]) {
    let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(
        analysis.paths_at(node),
        expected,
        "Unexpected access paths at {node}"
    );
}

/// Source access paths of all results, printed
pub fn source_vars(results: &InfoflowResults<Name>) -> BTreeSet<String> {
    results
        .results()
        .iter()
        .map(|r| r.source_access_path.to_string())
        .collect()
}

/// Source statements of all results
pub fn source_stmts(results: &InfoflowResults<Name>) -> BTreeSet<String> {
    results
        .results()
        .iter()
        .map(|r| r.source_stmt.to_string())
        .collect()
}

/// Assert the exact set of source variables connected to a sink
pub fn assert_sources(results: &InfoflowResults<Name>, expected: &[&str]) {
    let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(
        source_vars(results),
        expected,
        "Unexpected sources. Results: {:?}",
        results.results()
    );
}
