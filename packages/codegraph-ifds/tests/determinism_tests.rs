//! Property-based tests for the solver fixed point
//!
//! Random straight-line programs with copies and an optional call: the set
//! of facts per statement must not depend on the thread count or scheduling
//! strategy, and adding a source never removes a fact.

mod common;

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use codegraph_ifds::features::ifds::SchedulingStrategy;
use codegraph_ifds::SimpleIcfg;
use common::*;

const VARS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone)]
struct Program {
    len: usize,
    sources: Vec<(usize, usize)>,
    assigns: Vec<(usize, usize, usize)>,
    call_at: Option<usize>,
}

impl Program {
    fn build(&self, extra_source: Option<(usize, usize)>) -> (SimpleIcfg, TaintRules) {
        let mut icfg = SimpleIcfg::new();
        add_chain_method(&mut icfg, "main", "n", self.len);
        icfg.add_method("f", &["f0", "f1", "f2"]);

        let mut rules = TaintRules::new().with_assign("f1", "r", "p");
        for &(at, var) in self.sources.iter().chain(extra_source.iter()) {
            rules = rules.with_source(&format!("n{at}"), VARS[var]);
        }
        for &(at, lhs, rhs) in &self.assigns {
            rules = rules.with_assign(&format!("n{at}"), VARS[lhs], VARS[rhs]);
        }
        if let Some(at) = self.call_at {
            let site = format!("n{at}");
            icfg.add_call(&site, "f");
            rules = rules
                .with_arg(&site, "a", "p")
                .with_return(&site, "r", "d");
        }
        (icfg, rules)
    }
}

fn program() -> impl Strategy<Value = Program> {
    (3usize..10).prop_flat_map(|len| {
        (
            Just(len),
            prop::collection::vec((0..len - 1, 0..VARS.len()), 1..3),
            prop::collection::vec((0..len - 1, 0..VARS.len(), 0..VARS.len()), 0..8),
            prop::option::of(1..len - 1),
        )
            .prop_map(|(len, sources, assigns, call_at)| Program {
                len,
                sources,
                assigns,
                call_at,
            })
    })
}

fn fixed_point(
    scenario: (SimpleIcfg, TaintRules),
    len: usize,
    threads: usize,
    strategy: SchedulingStrategy,
) -> BTreeMap<String, BTreeSet<String>> {
    let (icfg, rules) = scenario;
    let config = unbounded_solver_config()
        .num_threads(threads)
        .scheduling_strategy(strategy);
    let analysis = Analysis::new(icfg, rules, "n0", config);
    assert_complete(&analysis.solve());

    let mut nodes: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
    nodes.extend(["f0", "f1", "f2"].iter().map(|s| s.to_string()));
    nodes
        .into_iter()
        .map(|n| {
            let facts = analysis.paths_at(&n);
            (n, facts)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_fixed_point_independent_of_scheduling(program in program()) {
        let sequential = fixed_point(
            program.build(None),
            program.len,
            1,
            SchedulingStrategy::EachEdgeIndividually,
        );
        for strategy in [
            SchedulingStrategy::EachEdgeIndividually,
            SchedulingStrategy::EachMethodIndividually,
            SchedulingStrategy::AllEdgesLocally,
        ] {
            let parallel = fixed_point(program.build(None), program.len, 4, strategy);
            prop_assert_eq!(&sequential, &parallel, "strategy {:?}", strategy);
        }
    }

    #[test]
    fn prop_more_sources_never_remove_facts(
        program in program(),
        var in 0..VARS.len(),
    ) {
        let base = fixed_point(
            program.build(None),
            program.len,
            2,
            SchedulingStrategy::EachEdgeIndividually,
        );
        let extended = fixed_point(
            program.build(Some((0, var))),
            program.len,
            2,
            SchedulingStrategy::EachEdgeIndividually,
        );
        for (node, facts) in &base {
            let more = &extended[node];
            prop_assert!(
                facts.is_subset(more),
                "{} lost facts: {:?} vs {:?}",
                node,
                facts,
                more
            );
        }
    }
}
