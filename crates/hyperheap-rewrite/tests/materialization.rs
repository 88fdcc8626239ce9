mod common;

use common::{list_edge_at, tree_edge_at};
use hyperheap_graph::*;
use hyperheap_rewrite::*;
use hyperheap_test_utils::{BalancedTreeFixture, ListFixture};
use test_log::test;

// ---------------------------------------------------------------------------
// Plain grammars
// ---------------------------------------------------------------------------

#[test]
fn test_list_edge_unfolds_into_both_rules() {
    let mut fixture = ListFixture::new();
    let (heap, x) = list_edge_at(&mut fixture, "x");
    let points = ViolationPoints::new().with(x, fixture.next);

    let strategy = MaterializationStrategy::new(fixture.grammar.clone());
    let MaterializeResult::Resolved(results) = strategy.materialize(&heap, &points) else {
        panic!("expected the List edge to be unfolded");
    };

    let mut sizes: Vec<usize> = results.iter().map(|h| h.node_count()).collect();
    sizes.sort();
    assert_eq!(sizes, vec![2, 3]);
    for result in &results {
        assert!(points.is_satisfied_by(result));
    }
}

#[test]
fn test_satisfied_heap_is_left_alone() {
    let mut fixture = ListFixture::new();
    let heap = fixture.null_terminated(2, "x");
    let x = fixture.variable("x");
    let points = ViolationPoints::new().with(x, fixture.next);

    let strategy = MaterializationStrategy::new(fixture.grammar.clone());
    assert_eq!(strategy.materialize(&heap, &points), MaterializeResult::Satisfied);
}

#[test]
fn test_missing_variable_is_ignored() {
    let mut fixture = ListFixture::new();
    let (heap, _) = list_edge_at(&mut fixture, "x");
    let y = fixture.variable("y");
    let points = ViolationPoints::new().with(y, fixture.next);

    let strategy = MaterializationStrategy::new(fixture.grammar.clone());
    assert_eq!(strategy.materialize(&heap, &points), MaterializeResult::Satisfied);
}

#[test]
fn test_unresolvable_violation() {
    let mut fixture = ListFixture::new();
    let (heap, x) = list_edge_at(&mut fixture, "x");
    let prev = fixture.symbols.selector("prev");
    let points = ViolationPoints::new().with(x, prev);

    let strategy = MaterializationStrategy::new(fixture.grammar.clone());
    let result = strategy.materialize(&heap, &points);
    assert_eq!(result, MaterializeResult::NoRuleApplicable);
    assert!(result.into_heaps().is_empty());
}

#[test]
fn test_default_applier_rejects_indexed_responses() {
    let mut fixture = ListFixture::new();
    let (heap, _) = list_edge_at(&mut fixture, "x");
    let edge = heap.edges().next().unwrap();
    let response = GrammarResponse::Indexed {
        symbol: None,
        by_materialization: Default::default(),
    };
    let err = DefaultApplier.apply(&heap, edge, &response).unwrap_err();
    assert!(matches!(err, RewriteError::WrongResponseType("indexed")));
}

// ---------------------------------------------------------------------------
// Indexed grammars
// ---------------------------------------------------------------------------

#[test]
fn test_abstract_index_is_materialized_per_rule() {
    let mut fixture = BalancedTreeFixture::new();
    let x_symbol = fixture.x;
    let (heap, x) = tree_edge_at(&mut fixture, &[x_symbol], "x");
    let points = ViolationPoints::new().with(x, fixture.left);

    let strategy = MaterializationStrategy::new(fixture.grammar.clone())
        .with_indexed(fixture.index_grammar.clone());
    let results = strategy.materialize(&heap, &points).into_heaps();

    assert_eq!(results.len(), 2);
    let inner = results.iter().find(|h| h.node_count() == 4).unwrap();
    assert_eq!(
        common::labels(inner),
        vec![fixture.nonterminal(&[x_symbol]), fixture.nonterminal(&[x_symbol])]
    );
    let leaf = results.iter().find(|h| h.node_count() == 2).unwrap();
    assert_eq!(leaf.edge_count(), 0);
    assert!(points.is_satisfied_by(leaf));
}

#[test]
fn test_concrete_index_resolves_without_materialization() {
    let mut fixture = BalancedTreeFixture::new();
    let (s, z) = (fixture.s, fixture.z);
    let (heap, x) = tree_edge_at(&mut fixture, &[s, z], "x");
    let points = ViolationPoints::new().with(x, fixture.left_heavy);

    let strategy = MaterializationStrategy::new(fixture.grammar.clone())
        .with_indexed(fixture.index_grammar.clone());
    let results = strategy.materialize(&heap, &points).into_heaps();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].node_count(), 3);
    assert_eq!(common::labels(&results[0]), vec![fixture.nonterminal(&[z])]);
}

#[test]
fn test_indexed_edge_needs_index_matcher() {
    let mut fixture = BalancedTreeFixture::new();
    let x_symbol = fixture.x;
    let (heap, _) = tree_edge_at(&mut fixture, &[x_symbol], "x");
    let edge = heap.edges().next().unwrap();
    let manager = RuleManager::new(fixture.grammar.clone());
    assert!(matches!(
        manager.rules_for(&heap, edge, 0, fixture.left),
        Err(RewriteError::UnexpectedNonterminal(e)) if e == edge
    ));
}
