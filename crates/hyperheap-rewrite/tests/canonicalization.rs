mod common;

use std::sync::Arc;

use common::{labels, list_edge_at, tree_edge_at};
use hyperheap_graph::*;
use hyperheap_rewrite::*;
use hyperheap_test_utils::{BalancedTreeFixture, ListFixture};
use rustc_hash::FxHashSet;
use test_log::test;

fn list_strategy(fixture: &ListFixture) -> CanonicalizationStrategy {
    CanonicalizationStrategy::builder()
        .grammar(fixture.grammar.clone())
        .build()
}

fn tree_strategy(fixture: &BalancedTreeFixture) -> CanonicalizationStrategy {
    CanonicalizationStrategy::builder()
        .grammar(fixture.grammar.clone())
        .index_grammar(fixture.index_grammar.clone())
        .build()
}

// ---------------------------------------------------------------------------
// Plain grammars
// ---------------------------------------------------------------------------

#[test]
fn test_chain_folds_into_single_edge() {
    let fixture = ListFixture::new();
    let (heap, _) = fixture.chain(5);

    let result = list_strategy(&fixture).canonicalize(heap, AbstractionMode::Admissible);
    assert_eq!(result.node_count(), 2);
    assert_eq!(labels(&result), vec![Nonterminal::from(fixture.list)]);
}

#[test]
fn test_canonicalization_is_idempotent() {
    let mut fixture = ListFixture::new();
    let x = fixture.variable("x");
    let (heap, nodes) = fixture.chain(4);
    let mut builder = heap.builder();
    builder.add_variable(x, nodes[1]);
    let heap = builder.build();

    let strategy = list_strategy(&fixture);
    let once = strategy.canonicalize(heap, AbstractionMode::Admissible);
    let twice = strategy.canonicalize(once.clone(), AbstractionMode::Admissible);
    assert_eq!(once, twice);
    // the node of x survives
    assert!(once.variable_target(x).is_some());
    assert_eq!(once.node_count(), 3);
}

#[test]
fn test_unfolding_an_abstraction_recovers_the_host() {
    let mut fixture = ListFixture::new();
    let x = fixture.variable("x");
    let host = {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(fixture.node, 3);
        builder.add_selector(nodes[0], fixture.next, nodes[1]).unwrap();
        builder.add_edge(fixture.list, &[nodes[1], nodes[2]]).unwrap();
        builder.add_variable(x, nodes[0]);
        builder.build()
    };

    let abstracted = list_strategy(&fixture).canonicalize(host.clone(), AbstractionMode::Admissible);
    assert_eq!(abstracted.node_count(), 2);

    let points = ViolationPoints::new().with(x, fixture.next);
    let unfolded = MaterializationStrategy::new(fixture.grammar.clone())
        .materialize(&abstracted, &points)
        .into_heaps();
    assert!(unfolded.contains(&host));
}

#[test]
fn test_admissible_mode_keeps_selectors_of_variables() {
    let mut fixture = ListFixture::new();
    let x = fixture.variable("x");
    let (heap, nodes) = fixture.chain(2);
    let mut builder = heap.builder();
    builder.add_variable(x, nodes[0]);
    let heap = builder.build();

    let options = MorphismOptions::new(fixture.symbols.constants()).with_admissible_abstraction(true);
    let strategy = CanonicalizationStrategy::builder()
        .grammar(fixture.grammar.clone())
        .options(options)
        .build();

    let kept = strategy.canonicalize(heap.clone(), AbstractionMode::Admissible);
    assert_eq!(kept, heap);
    let folded = strategy.canonicalize(heap, AbstractionMode::Aggressive);
    assert_eq!(folded.edge_count(), 1);
}

#[test]
fn test_single_edge_heap_is_already_canonical() {
    let mut fixture = ListFixture::new();
    let (heap, _) = list_edge_at(&mut fixture, "x");
    let result = list_strategy(&fixture).canonicalize(heap.clone(), AbstractionMode::Aggressive);
    assert_eq!(result, heap);
}

// ---------------------------------------------------------------------------
// Indexed grammars
// ---------------------------------------------------------------------------

#[test]
fn test_balanced_tree_folds_to_abstract_index() {
    let fixture = BalancedTreeFixture::new();
    let result = tree_strategy(&fixture).canonicalize(fixture.concrete_tree(), AbstractionMode::Admissible);

    assert_eq!(result.node_count(), 2);
    assert_eq!(labels(&result), vec![fixture.nonterminal(&[fixture.x])]);
}

#[test]
fn test_index_materialization_is_undone_by_abstraction() {
    let mut fixture = BalancedTreeFixture::new();
    let (s, x) = (fixture.s, fixture.x);
    let (heap, _) = tree_edge_at(&mut fixture, &[x], "x");

    let materialized = materialize_indices(heap.clone(), x, &[s, x]).unwrap();
    assert_eq!(labels(&materialized), vec![fixture.nonterminal(&[s, x])]);

    let abstraction = IndexCanonicalization::new(fixture.index_grammar.clone());
    let (restored, changed) = abstraction.apply(materialized).unwrap();
    assert!(changed);
    assert_eq!(restored, heap);
}

#[test]
fn test_concrete_symbols_cannot_be_materialized() {
    let mut fixture = BalancedTreeFixture::new();
    let (s, z) = (fixture.s, fixture.z);
    let (heap, _) = tree_edge_at(&mut fixture, &[z], "x");
    assert!(matches!(
        materialize_indices(heap, z, &[s, z]),
        Err(RewriteError::CannotMaterialize(symbol)) if symbol == z
    ));
}

#[test]
fn test_index_abstraction_requires_uniform_indices() {
    let fixture = BalancedTreeFixture::new();
    let (s, z, x) = (fixture.s, fixture.z, fixture.x);
    let mut builder = HeapConfiguration::new().builder();
    let nodes = builder.add_nodes(fixture.tree, 3);
    builder.add_edge(fixture.nonterminal(&[x]), &[nodes[0], nodes[2]]).unwrap();
    builder.add_edge(fixture.nonterminal(&[s, z]), &[nodes[1], nodes[2]]).unwrap();
    let heap = builder.build();

    // Z -> X is blocked by the edge that already ends in X
    let abstraction = IndexCanonicalization::new(fixture.index_grammar.clone());
    let (result, changed) = abstraction.apply(heap.clone()).unwrap();
    assert!(!changed);
    assert_eq!(result, heap);
}

#[test]
fn test_null_pointer_guard_blocks_index_abstraction() {
    let mut fixture = BalancedTreeFixture::new();
    let z = fixture.z;
    let null = fixture.symbols.null_name();
    let null_type = fixture.symbols.null_type();
    let heap = {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(fixture.tree, 3);
        let null_node = builder.add_node(null_type);
        builder.add_edge(fixture.nonterminal(&[z]), &[nodes[0], nodes[1]]).unwrap();
        builder.add_selector(nodes[2], fixture.left, null_node).unwrap();
        builder.add_variable(null, null_node);
        builder.build()
    };

    let guards: FxHashSet<Selector> = [fixture.left].into_iter().collect();
    let guarded = IndexCanonicalization::new(fixture.index_grammar.clone())
        .with_guard(Arc::new(NullPointerGuard::new(guards, null)));
    let (blocked, changed) = guarded.apply(heap.clone()).unwrap();
    assert!(!changed);
    assert_eq!(labels(&blocked), vec![fixture.nonterminal(&[z])]);

    let unguarded = IndexCanonicalization::new(fixture.index_grammar.clone());
    let abstracted = unguarded.canonicalize(heap).unwrap();
    assert_eq!(labels(&abstracted), vec![fixture.nonterminal(&[fixture.x])]);
}

#[test]
fn test_closure_guard() {
    let mut fixture = BalancedTreeFixture::new();
    let z = fixture.z;
    let (heap, _) = tree_edge_at(&mut fixture, &[z], "x");
    let never = |_: &HeapConfiguration| false;
    let abstraction = IndexCanonicalization::new(fixture.index_grammar.clone()).with_guard(Arc::new(never));
    assert_eq!(abstraction.canonicalize(heap.clone()).unwrap(), heap);
}
