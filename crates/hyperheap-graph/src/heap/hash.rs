use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smallvec::SmallVec;

use super::{HeapConfiguration, Node};
use crate::MorphismSearch;

impl HeapConfiguration {
    /// Hash of the local neighbourhood of a node that does not depend on ids.
    fn node_signature(&self, node: Node) -> u64 {
        let mut hasher = FxHasher::default();
        self.node_type(node).hash(&mut hasher);
        self.is_external(node).hash(&mut hasher);

        let mut selectors: SmallVec<[_; 4]> = self
            .selectors(node)
            .iter()
            .map(|(selector, target)| (*selector, self.node_type(*target)))
            .collect();
        selectors.sort_unstable();
        selectors.hash(&mut hasher);

        let mut incoming: SmallVec<[_; 4]> = self
            .predecessors(node)
            .iter()
            .map(|(selector, _)| *selector)
            .collect();
        incoming.sort_unstable();
        incoming.hash(&mut hasher);

        let mut tentacles: SmallVec<[_; 4]> = self
            .tentacles_at(node)
            .iter()
            .map(|(edge, position)| (self.label_of(*edge).clone(), *position))
            .collect();
        tentacles.sort_unstable();
        tentacles.hash(&mut hasher);

        let mut names = self.variable_names(node);
        names.sort_unstable();
        names.hash(&mut hasher);
        hasher.finish()
    }
}

/// Depends only on the isomorphism class, ignoring the order of external
/// nodes, so heaps that differ by an external permutation share a bucket.
impl Hash for HeapConfiguration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut signatures: Vec<u64> = self.nodes().map(|n| self.node_signature(n)).collect();
        signatures.sort_unstable();
        self.node_count().hash(state);
        self.edge_count().hash(state);
        self.rank().hash(state);
        signatures.hash(state);
    }
}

/// Isomorphism that maps the i-th external node to the i-th external node.
impl PartialEq for HeapConfiguration {
    fn eq(&self, other: &Self) -> bool {
        MorphismSearch::isomorphism(self, other).exists()
    }
}

impl Eq for HeapConfiguration {}
