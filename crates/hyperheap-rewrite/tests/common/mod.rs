use hyperheap_graph::*;
use hyperheap_test_utils::{BalancedTreeFixture, ListFixture};

// ---------------------------------------------------------------------------
// Heap shapes shared by the rewrite tests
// ---------------------------------------------------------------------------

/// `x -> n0`, `List(n0, n1)`.
pub fn list_edge_at(fixture: &mut ListFixture, variable: &str) -> (HeapConfiguration, Name) {
    let x = fixture.variable(variable);
    let mut builder = HeapConfiguration::new().builder();
    let nodes = builder.add_nodes(fixture.node, 2);
    builder.add_edge(fixture.list, &nodes).unwrap();
    builder.add_variable(x, nodes[0]);
    (builder.build(), x)
}

/// `x -> root`, `B[index](root, end)`.
pub fn tree_edge_at(
    fixture: &mut BalancedTreeFixture,
    index: &[IndexSymbol],
    variable: &str,
) -> (HeapConfiguration, Name) {
    let x = fixture.symbols.variable(variable);
    let mut builder = HeapConfiguration::new().builder();
    let nodes = builder.add_nodes(fixture.tree, 2);
    builder.add_edge(fixture.nonterminal(index), &nodes).unwrap();
    builder.add_variable(x, nodes[0]);
    (builder.build(), x)
}

/// Labels of all nonterminal edges, sorted.
pub fn labels(heap: &HeapConfiguration) -> Vec<Nonterminal> {
    let mut labels: Vec<Nonterminal> = heap.edges().map(|e| heap.label_of(e).clone()).collect();
    labels.sort();
    labels
}
