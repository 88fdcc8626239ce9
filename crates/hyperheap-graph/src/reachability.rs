use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::{HeapConfiguration, HeapBuilder, Node};

/// Nodes reachable from `sources` along selectors and along nonterminal
/// edges entered through a tentacle that is not a reduction tentacle.
pub fn reachable_nodes(
    heap: &HeapConfiguration,
    sources: impl IntoIterator<Item = Node>,
) -> FxHashSet<Node> {
    let mut reachable = FxHashSet::default();
    let mut queue = VecDeque::new();
    for source in sources {
        if reachable.insert(source) {
            queue.push_back(source);
        }
    }
    while let Some(node) = queue.pop_front() {
        for successor in heap.successors(node) {
            if reachable.insert(successor) {
                queue.push_back(successor);
            }
        }
        for edge in heap.attached_edges_with_non_reduction_tentacle(node) {
            for attached in heap.attached_nodes(edge) {
                if reachable.insert(*attached) {
                    queue.push_back(*attached);
                }
            }
        }
    }
    reachable
}

/// Roots of a heap: targets of variables and external nodes.
pub fn roots(heap: &HeapConfiguration) -> Vec<Node> {
    heap.variables()
        .map(|v| heap.target_of(v))
        .chain(heap.externals().iter().copied())
        .collect()
}

impl HeapBuilder {
    /// Remove every node unreachable from variables and external nodes.
    /// Returns the number of removed nodes.
    pub fn collect_garbage(&mut self) -> usize {
        let reachable = reachable_nodes(self.heap(), roots(self.heap()));
        let garbage: Vec<Node> = self
            .heap()
            .nodes()
            .filter(|node| !reachable.contains(node))
            .collect();
        for node in &garbage {
            self.remove_node(*node);
        }
        garbage.len()
    }
}
