mod builder;
mod display;
mod hash;

pub use builder::HeapBuilder;

use smallvec::SmallVec;

use crate::arena::{Arena, Id};

use crate::{Name, Nonterminal, Selector, Type, identifier};

identifier! {
    /// A heap node (object).
    struct Node
}

identifier! {
    /// A nonterminal hyperedge.
    struct Edge
}

identifier! {
    /// An edge attaching a variable name to a node.
    struct VariableEdge
}

#[derive(Clone, Debug)]
pub(crate) struct NodeInfo {
    pub(crate) ty: Type,
    pub(crate) selectors: SmallVec<[(Selector, Node); 2]>,
    pub(crate) predecessors: SmallVec<[(Selector, Node); 2]>,
    pub(crate) tentacles: SmallVec<[(Edge, usize); 2]>,
    pub(crate) variables: SmallVec<[VariableEdge; 1]>,
}

impl NodeInfo {
    fn new(ty: Type) -> Self {
        Self {
            ty,
            selectors: SmallVec::new(),
            predecessors: SmallVec::new(),
            tentacles: SmallVec::new(),
            variables: SmallVec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct EdgeInfo {
    pub(crate) label: Nonterminal,
    pub(crate) tentacles: SmallVec<[Node; 4]>,
}

#[derive(Clone, Debug)]
pub(crate) struct VariableInfo {
    pub(crate) name: Name,
    pub(crate) target: Node,
}

/// A labeled hypergraph describing a heap.
///
/// Nodes are typed objects, selector edges are pointer fields, nonterminal
/// hyperedges stand for abstracted heap parts, and variable edges attach
/// program variables and constants to nodes. The ordered external nodes form
/// the interface used when the heap is the right-hand side of a rule or the
/// precondition of a contract.
///
/// A `HeapConfiguration` is never mutated in place: [`HeapConfiguration::builder`]
/// consumes it and [`HeapBuilder::build`] returns the changed heap.
///
/// Equality is isomorphism respecting the order of external nodes; the
/// hash only depends on the isomorphism class and ignores external order.
#[derive(Clone, Debug, Default)]
pub struct HeapConfiguration {
    pub(crate) nodes: Arena<Node, NodeInfo>,
    pub(crate) edges: Arena<Edge, EdgeInfo>,
    pub(crate) variables: Arena<VariableEdge, VariableInfo>,
    pub(crate) externals: SmallVec<[Node; 4]>,
}

impl HeapConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder(self) -> HeapBuilder {
        HeapBuilder::new(self)
    }

    // -- Nodes -------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.ids()
    }

    pub fn contains_node(&self, node: Node) -> bool {
        self.nodes.contains(node)
    }

    pub fn node_type(&self, node: Node) -> Type {
        self.nodes[node].ty
    }

    /// Outgoing selector edges of a node in insertion order.
    pub fn selectors(&self, node: Node) -> &[(Selector, Node)] {
        &self.nodes[node].selectors
    }

    pub fn selector_labels(&self, node: Node) -> impl Iterator<Item = Selector> + '_ {
        self.selectors(node).iter().map(|(selector, _)| *selector)
    }

    pub fn selector_target(&self, node: Node, selector: Selector) -> Option<Node> {
        self.selectors(node)
            .iter()
            .find(|(label, _)| *label == selector)
            .map(|(_, target)| *target)
    }

    pub fn successors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.selectors(node).iter().map(|(_, target)| *target)
    }

    /// Incoming selector edges as `(selector, source)` pairs.
    pub fn predecessors(&self, node: Node) -> &[(Selector, Node)] {
        &self.nodes[node].predecessors
    }

    /// `(edge, tentacle)` pairs of every nonterminal edge attached to the node.
    pub fn tentacles_at(&self, node: Node) -> &[(Edge, usize)] {
        &self.nodes[node].tentacles
    }

    /// Nonterminal edges attached to the node, each reported once.
    pub fn attached_edges(&self, node: Node) -> SmallVec<[Edge; 4]> {
        let mut edges = SmallVec::new();
        for (edge, _) in self.tentacles_at(node) {
            if !edges.contains(edge) {
                edges.push(*edge);
            }
        }
        edges
    }

    /// Attached nonterminal edges where the node sits at a tentacle that has
    /// not been reduced.
    pub fn attached_edges_with_non_reduction_tentacle(&self, node: Node) -> SmallVec<[Edge; 4]> {
        let mut edges = SmallVec::new();
        for (edge, tentacle) in self.tentacles_at(node) {
            if !self.label_of(*edge).is_reduction_tentacle(*tentacle) && !edges.contains(edge) {
                edges.push(*edge);
            }
        }
        edges
    }

    pub fn attached_variables(&self, node: Node) -> &[VariableEdge] {
        &self.nodes[node].variables
    }

    // -- External nodes ----------------------------------------------------

    pub fn externals(&self) -> &[Node] {
        &self.externals
    }

    pub fn rank(&self) -> usize {
        self.externals.len()
    }

    pub fn external_at(&self, position: usize) -> Option<Node> {
        self.externals.get(position).copied()
    }

    pub fn is_external(&self, node: Node) -> bool {
        self.externals.contains(&node)
    }

    pub fn external_index_of(&self, node: Node) -> Option<usize> {
        self.externals.iter().position(|external| *external == node)
    }

    // -- Nonterminal edges -------------------------------------------------

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.ids()
    }

    pub fn contains_edge(&self, edge: Edge) -> bool {
        self.edges.contains(edge)
    }

    pub fn label_of(&self, edge: Edge) -> &Nonterminal {
        &self.edges[edge].label
    }

    /// Nodes attached to the edge, ordered by tentacle.
    pub fn attached_nodes(&self, edge: Edge) -> &[Node] {
        &self.edges[edge].tentacles
    }

    // -- Variables ---------------------------------------------------------

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableEdge> + '_ {
        self.variables.ids()
    }

    pub fn variable_with(&self, name: Name) -> Option<VariableEdge> {
        self.variables
            .iter()
            .find(|(_, info)| info.name == name)
            .map(|(id, _)| id)
    }

    pub fn name_of(&self, variable: VariableEdge) -> Name {
        self.variables[variable].name
    }

    pub fn target_of(&self, variable: VariableEdge) -> Node {
        self.variables[variable].target
    }

    /// Node referenced by the variable with the given name, if present.
    pub fn variable_target(&self, name: Name) -> Option<Node> {
        self.variable_with(name).map(|v| self.target_of(v))
    }

    pub fn variable_names(&self, node: Node) -> SmallVec<[Name; 2]> {
        self.attached_variables(node)
            .iter()
            .map(|v| self.name_of(*v))
            .collect()
    }
}
