use std::collections::VecDeque;

use hyperheap_graph::{
    Edge, GraphError, HeapBuilder, HeapConfiguration, Node, Nonterminal, SymbolTable,
};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::ProcedureError;

/// A heap split at a call site into the part the callee can access and the
/// rest of the caller's heap.
///
/// `outside` holds a placeholder edge attached to the cutpoints, the nodes
/// of the callee's part that are still visible to the caller. The cutpoints
/// are the external nodes of `in_scope`, in the same order as the
/// placeholder's tentacles.
#[derive(Clone, Debug)]
pub struct ScopedHeap {
    in_scope: HeapConfiguration,
    outside: HeapConfiguration,
    placeholder: Edge,
}

impl ScopedHeap {
    pub fn in_scope(&self) -> &HeapConfiguration {
        &self.in_scope
    }

    pub fn into_in_scope(self) -> HeapConfiguration {
        self.in_scope
    }

    pub fn outside(&self) -> &HeapConfiguration {
        &self.outside
    }

    pub fn placeholder(&self) -> Edge {
        self.placeholder
    }

    /// Glue a postcondition of the callee back into the caller's heap.
    ///
    /// External `i` of `postcondition` is attached where tentacle
    /// `permutation[i]` of the placeholder was.
    pub fn merge_postcondition(
        &self,
        postcondition: &HeapConfiguration,
        permutation: &[usize],
    ) -> Result<HeapConfiguration, GraphError> {
        let mut builder = self.outside.clone().builder();
        builder
            .reorder_tentacles(self.placeholder, permutation)?
            .replace_edge(self.placeholder, postcondition)?;
        Ok(builder.build())
    }
}

/// Cut the part of `heap` reachable from parameters out of the heap.
///
/// Parameter and constant variables move into the scope. Everything reachable
/// from a parameter through selectors and nonterminal edges is copied into the
/// scope and removed from the caller's heap, except for the cutpoints. These
/// are found by walking from every other variable and every external node of
/// `heap` until the walk hits the scope. The placeholder edge is labeled
/// `<method><rank>`.
pub fn extract_scope(
    heap: &HeapConfiguration,
    method: &str,
    symbols: &mut SymbolTable,
) -> Result<ScopedHeap, ProcedureError> {
    let mut fragment = Fragment::new(heap);
    let mut outside = heap.clone().builder();

    for variable in heap.variables() {
        let name = heap.name_of(variable);
        let parameter = symbols.is_parameter(name);
        if !parameter && !symbols.is_constant(name) {
            continue;
        }
        // constants are never explored, they have no fields
        let copy = fragment.translate(heap.target_of(variable), parameter);
        fragment.builder.add_variable(name, copy);
        outside.remove_variable(variable);
    }
    fragment.explore(&mut outside)?;

    let cutpoints = find_cutpoints(heap, &fragment.mapping, symbols);
    for cutpoint in &cutpoints {
        fragment.builder.set_external(fragment.mapping[cutpoint]);
    }
    for node in fragment.mapping.keys() {
        if !cutpoints.contains(node) {
            outside.remove_node(*node);
        }
    }

    let rank = cutpoints.len();
    let label = symbols.nonterminal_of_rank(&format!("{method}{rank}"), rank)?;
    outside.add_edge(label, &cutpoints)?;
    let outside = outside.build();
    let placeholder = outside
        .edges()
        .filter(|edge| *outside.label_of(*edge) == Nonterminal::from(label))
        .last()
        .ok_or_else(|| ProcedureError::MissingPlaceholder(method.to_string()))?;

    let in_scope = fragment.builder.build();
    debug!(
        "scope of `{method}`: {} of {} nodes, {rank} cutpoints",
        in_scope.node_count(),
        heap.node_count()
    );
    Ok(ScopedHeap {
        in_scope,
        outside,
        placeholder,
    })
}

/// The part of a heap reachable from the parameters, under construction.
struct Fragment<'a> {
    heap: &'a HeapConfiguration,
    builder: HeapBuilder,
    mapping: FxHashMap<Node, Node>,
    queue: VecDeque<Node>,
}

impl<'a> Fragment<'a> {
    fn new(heap: &'a HeapConfiguration) -> Self {
        Self {
            heap,
            builder: HeapConfiguration::new().builder(),
            mapping: FxHashMap::default(),
            queue: VecDeque::new(),
        }
    }

    /// Copy of `node` in the fragment, created on first use.
    fn translate(&mut self, node: Node, explore: bool) -> Node {
        if let Some(copy) = self.mapping.get(&node) {
            if explore {
                self.queue.push_back(node);
            }
            return *copy;
        }
        let copy = self.builder.add_node(self.heap.node_type(node));
        self.mapping.insert(node, copy);
        if explore {
            self.queue.push_back(node);
        }
        copy
    }

    /// Move everything reachable from the queued nodes out of `outside`.
    fn explore(&mut self, outside: &mut HeapBuilder) -> Result<(), GraphError> {
        let heap = self.heap;
        let mut explored = FxHashSet::default();
        let mut moved_edges = FxHashSet::default();
        while let Some(node) = self.queue.pop_front() {
            if !explored.insert(node) {
                continue;
            }
            let source = self.mapping[&node];
            for (selector, target) in heap.selectors(node) {
                let target_copy = self.translate(*target, true);
                self.builder.add_selector(source, *selector, target_copy)?;
                outside.remove_selector(node, *selector)?;
            }
            for edge in heap.attached_edges(node) {
                if !moved_edges.insert(edge) {
                    continue;
                }
                let tentacles: SmallVec<[Node; 4]> = heap
                    .attached_nodes(edge)
                    .iter()
                    .map(|attached| self.translate(*attached, true))
                    .collect();
                self.builder.add_edge(heap.label_of(edge).clone(), &tentacles)?;
                outside.remove_edge(edge);
            }
        }
        Ok(())
    }
}

/// Nodes of the fragment that the caller can still reach, in discovery order.
fn find_cutpoints(
    heap: &HeapConfiguration,
    mapping: &FxHashMap<Node, Node>,
    symbols: &SymbolTable,
) -> Vec<Node> {
    let mut pending: VecDeque<Node> = heap
        .variables()
        .filter(|variable| !symbols.is_parameter(heap.name_of(*variable)))
        .map(|variable| heap.target_of(variable))
        .chain(heap.externals().iter().copied())
        .collect();
    let mut seen = FxHashSet::default();
    let mut cutpoints = Vec::new();
    while let Some(node) = pending.pop_front() {
        if mapping.contains_key(&node) {
            if !cutpoints.contains(&node) {
                cutpoints.push(node);
            }
            continue;
        }
        for successor in heap.successors(node) {
            if seen.insert(successor) {
                pending.push_back(successor);
            }
        }
        for edge in heap.attached_edges(node) {
            for attached in heap.attached_nodes(edge) {
                if *attached != node && seen.insert(*attached) {
                    pending.push_back(*attached);
                }
            }
        }
    }
    cutpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperheap_graph::{Selector, Type};

    struct Fixture {
        symbols: SymbolTable,
        node: Type,
        next: Selector,
    }

    fn fixture() -> Fixture {
        let mut symbols = SymbolTable::new();
        let node = symbols.declare_type("Node", &["next"]);
        let next = symbols.selector("next");
        Fixture { symbols, node, next }
    }

    /// `x -> n0 -> n1 -> n2`, `@param0` at `n1`.
    fn chain_with_parameter(f: &mut Fixture) -> HeapConfiguration {
        let x = f.symbols.variable("x");
        let param = f.symbols.variable("@param0");
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(f.node, 3);
        builder.add_selector(nodes[0], f.next, nodes[1]).unwrap();
        builder.add_selector(nodes[1], f.next, nodes[2]).unwrap();
        builder.add_variable(x, nodes[0]);
        builder.add_variable(param, nodes[1]);
        builder.build()
    }

    #[test]
    fn test_scope_cuts_at_first_reachable_node() {
        let mut f = fixture();
        let heap = chain_with_parameter(&mut f);
        let scoped = extract_scope(&heap, "tail", &mut f.symbols).unwrap();

        let in_scope = scoped.in_scope();
        assert_eq!(in_scope.node_count(), 2);
        assert_eq!(in_scope.rank(), 1);
        let param = f.symbols.variable("@param0");
        assert_eq!(in_scope.variable_target(param), in_scope.external_at(0));

        let outside = scoped.outside();
        assert_eq!(outside.node_count(), 2);
        assert!(outside.variable_target(param).is_none());
        assert_eq!(outside.attached_nodes(scoped.placeholder()).len(), 1);
        let label = f.symbols.lookup_nonterminal("tail1").unwrap();
        assert_eq!(*outside.label_of(scoped.placeholder()), Nonterminal::from(label));
    }

    #[test]
    fn test_merging_scope_restores_heap() {
        let mut f = fixture();
        let heap = chain_with_parameter(&mut f);
        let scoped = extract_scope(&heap, "tail", &mut f.symbols).unwrap();
        let merged = scoped
            .merge_postcondition(scoped.in_scope(), &[0])
            .unwrap();
        assert_eq!(merged, heap);
    }

    #[test]
    fn test_unreachable_scope_gets_rank_zero_placeholder() {
        let mut f = fixture();
        let param = f.symbols.variable("@param0");
        let mut builder = HeapConfiguration::new().builder();
        let node = builder.add_node(f.node);
        builder.add_variable(param, node);
        let heap = builder.build();

        let scoped = extract_scope(&heap, "run", &mut f.symbols).unwrap();
        assert_eq!(scoped.in_scope().rank(), 0);
        assert_eq!(scoped.outside().node_count(), 0);
        assert_eq!(scoped.outside().edge_count(), 1);
    }
}
