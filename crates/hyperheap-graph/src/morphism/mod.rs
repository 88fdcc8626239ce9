//! Structure-preserving maps between heaps.
//!
//! A [`Morphism`] maps the nodes and nonterminal edges of a pattern heap into
//! a target heap. [`MorphismSearch`] enumerates them by backtracking, either
//! as embeddings (the pattern is a subgraph whose inner nodes are not touched
//! by anything else) or as isomorphisms.

mod search;

pub use search::MorphismSearch;

use rustc_hash::FxHashMap;

use crate::{Constants, Edge, Node};

/// What kind of map a [`MorphismSearch`] looks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphismKind {
    /// Pattern internal nodes keep their exact neighbourhood in the target;
    /// pattern external nodes may carry additional structure.
    Embedding,
    /// A bijection preserving all structure. With `ordered_externals`, the
    /// i-th external node must map to the i-th external node.
    Isomorphism { ordered_externals: bool },
}

/// Admissibility options for embeddings used during abstraction.
#[derive(Clone, Debug, Default)]
pub struct MorphismOptions {
    admissible_abstraction: bool,
    admissible_constants: bool,
    constants: Constants,
}

impl MorphismOptions {
    pub fn new(constants: Constants) -> Self {
        Self {
            constants,
            ..Self::default()
        }
    }

    // -- Builder methods ---------------------------------------------------

    /// Forbid folding selectors away from nodes that variables or the
    /// interface still refer to.
    pub fn with_admissible_abstraction(mut self, enabled: bool) -> Self {
        self.admissible_abstraction = enabled;
        self
    }

    /// Treat constants like ordinary variables for admissibility.
    pub fn with_admissible_constants(mut self, enabled: bool) -> Self {
        self.admissible_constants = enabled;
        self
    }

    // -- Accessors ---------------------------------------------------------

    pub fn admissible_abstraction(&self) -> bool {
        self.admissible_abstraction
    }

    pub fn admissible_constants(&self) -> bool {
        self.admissible_constants
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }
}

/// A map from pattern nodes and edges to target nodes and edges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Morphism {
    nodes: FxHashMap<Node, Node>,
    edges: FxHashMap<Edge, Edge>,
}

impl Morphism {
    pub(crate) fn new(nodes: FxHashMap<Node, Node>, edges: FxHashMap<Edge, Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Image of a pattern node.
    ///
    /// # Panics
    /// If the node is not part of the pattern this morphism was found for.
    pub fn image(&self, node: Node) -> Node {
        match self.nodes.get(&node) {
            Some(image) => *image,
            None => panic!("{node:?} is not mapped by this morphism"),
        }
    }

    pub fn try_image(&self, node: Node) -> Option<Node> {
        self.nodes.get(&node).copied()
    }

    pub fn edge_image(&self, edge: Edge) -> Option<Edge> {
        self.edges.get(&edge).copied()
    }

    pub fn node_pairs(&self) -> impl Iterator<Item = (Node, Node)> + '_ {
        self.nodes.iter().map(|(p, t)| (*p, *t))
    }

    pub fn edge_pairs(&self) -> impl Iterator<Item = (Edge, Edge)> + '_ {
        self.edges.iter().map(|(p, t)| (*p, *t))
    }
}
