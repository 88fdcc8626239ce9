use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{Edge, EdgeInfo, HeapConfiguration, Node, NodeInfo, VariableEdge, VariableInfo};
use crate::{GraphError, Morphism, Name, Nonterminal, Selector, Type};

/// Consuming builder over a [`HeapConfiguration`].
///
/// Ids handed out by the builder are valid until [`HeapBuilder::build`],
/// which drops removed items and renumbers the rest. Relabeling an edge
/// never invalidates ids.
#[derive(Debug)]
pub struct HeapBuilder {
    heap: HeapConfiguration,
}

impl HeapBuilder {
    pub(crate) fn new(heap: HeapConfiguration) -> Self {
        Self { heap }
    }

    /// Read access to the heap under construction.
    pub fn heap(&self) -> &HeapConfiguration {
        &self.heap
    }

    pub fn build(mut self) -> HeapConfiguration {
        self.compact();
        self.heap
    }

    // -- Nodes -------------------------------------------------------------

    pub fn add_node(&mut self, ty: Type) -> Node {
        self.heap.nodes.alloc(NodeInfo::new(ty))
    }

    pub fn add_nodes(&mut self, ty: Type, count: usize) -> Vec<Node> {
        (0..count).map(|_| self.add_node(ty)).collect()
    }

    pub fn replace_node_type(&mut self, node: Node, ty: Type) -> &mut Self {
        self.heap.nodes[node].ty = ty;
        self
    }

    /// Remove a node that has no selectors, tentacles, or variables attached.
    pub fn remove_isolated_node(&mut self, node: Node) -> Result<&mut Self, GraphError> {
        let info = &self.heap.nodes[node];
        if !info.selectors.is_empty()
            || !info.predecessors.is_empty()
            || !info.tentacles.is_empty()
            || !info.variables.is_empty()
        {
            return Err(GraphError::NodeNotIsolated(node));
        }
        self.heap.externals.retain(|external| *external != node);
        self.heap.nodes.delete(node);
        Ok(self)
    }

    /// Remove a node together with everything attached to it.
    pub fn remove_node(&mut self, node: Node) -> &mut Self {
        let outgoing = self.heap.nodes[node].selectors.clone();
        for (selector, target) in outgoing {
            self.detach_selector(node, selector, target);
        }
        let incoming = self.heap.nodes[node].predecessors.clone();
        for (selector, source) in incoming {
            self.detach_selector(source, selector, node);
        }
        for edge in self.heap.attached_edges(node) {
            self.remove_edge(edge);
        }
        let variables = self.heap.nodes[node].variables.clone();
        for variable in variables {
            self.remove_variable(variable);
        }
        self.heap.externals.retain(|external| *external != node);
        self.heap.nodes.delete(node);
        self
    }

    // -- Selectors ---------------------------------------------------------

    pub fn add_selector(
        &mut self,
        from: Node,
        selector: Selector,
        to: Node,
    ) -> Result<&mut Self, GraphError> {
        if self.heap.selector_target(from, selector).is_some() {
            return Err(GraphError::SelectorExists {
                node: from,
                selector,
            });
        }
        self.attach_selector(from, selector, to);
        Ok(self)
    }

    pub fn remove_selector(&mut self, from: Node, selector: Selector) -> Result<&mut Self, GraphError> {
        let target = self
            .heap
            .selector_target(from, selector)
            .ok_or(GraphError::MissingSelector {
                node: from,
                selector,
            })?;
        self.detach_selector(from, selector, target);
        Ok(self)
    }

    /// Point `selector` of `from` at `to`, replacing a previous target.
    pub fn set_selector(&mut self, from: Node, selector: Selector, to: Node) -> &mut Self {
        if let Some(target) = self.heap.selector_target(from, selector) {
            self.detach_selector(from, selector, target);
        }
        self.attach_selector(from, selector, to);
        self
    }

    fn attach_selector(&mut self, from: Node, selector: Selector, to: Node) {
        self.heap.nodes[from].selectors.push((selector, to));
        self.heap.nodes[to].predecessors.push((selector, from));
    }

    fn detach_selector(&mut self, from: Node, selector: Selector, to: Node) {
        self.heap.nodes[from]
            .selectors
            .retain(|(label, _)| *label != selector);
        self.heap.nodes[to]
            .predecessors
            .retain(|(label, source)| !(*label == selector && *source == from));
    }

    // -- External nodes ----------------------------------------------------

    /// Append the node to the external sequence unless it is already external.
    pub fn set_external(&mut self, node: Node) -> &mut Self {
        if !self.heap.is_external(node) {
            self.heap.externals.push(node);
        }
        self
    }

    pub fn unset_external(&mut self, node: Node) -> &mut Self {
        self.heap.externals.retain(|external| *external != node);
        self
    }

    // -- Variables ---------------------------------------------------------

    /// Attach a variable to a node. A variable of the same name is moved.
    pub fn add_variable(&mut self, name: Name, node: Node) -> VariableEdge {
        if let Some(existing) = self.heap.variable_with(name) {
            self.remove_variable(existing);
        }
        let variable = self.heap.variables.alloc(VariableInfo { name, target: node });
        self.heap.nodes[node].variables.push(variable);
        variable
    }

    pub fn remove_variable(&mut self, variable: VariableEdge) -> &mut Self {
        let target = self.heap.variables[variable].target;
        self.heap.nodes[target].variables.retain(|v| *v != variable);
        self.heap.variables.delete(variable);
        self
    }

    pub fn remove_variable_named(&mut self, name: Name) -> &mut Self {
        if let Some(variable) = self.heap.variable_with(name) {
            self.remove_variable(variable);
        }
        self
    }

    // -- Nonterminal edges -------------------------------------------------

    pub fn add_edge(
        &mut self,
        label: impl Into<Nonterminal>,
        tentacles: &[Node],
    ) -> Result<Edge, GraphError> {
        let label = label.into();
        if label.rank() != tentacles.len() {
            return Err(GraphError::TentacleCount {
                rank: label.rank(),
                attached: tentacles.len(),
            });
        }
        let edge = self.heap.edges.alloc(EdgeInfo {
            label,
            tentacles: tentacles.iter().copied().collect(),
        });
        self.attach_tentacles(edge);
        Ok(edge)
    }

    pub fn remove_edge(&mut self, edge: Edge) -> &mut Self {
        self.detach_tentacles(edge);
        self.heap.edges.delete(edge);
        self
    }

    pub fn replace_edge_label(
        &mut self,
        edge: Edge,
        label: impl Into<Nonterminal>,
    ) -> Result<&mut Self, GraphError> {
        let label = label.into();
        let attached = self.heap.edges[edge].tentacles.len();
        if label.rank() != attached {
            return Err(GraphError::TentacleCount {
                rank: label.rank(),
                attached,
            });
        }
        self.heap.edges[edge].label = label;
        Ok(self)
    }

    /// Permute the tentacles of an edge: tentacle `i` afterwards attaches the
    /// node previously at tentacle `permutation[i]`.
    pub fn reorder_tentacles(
        &mut self,
        edge: Edge,
        permutation: &[usize],
    ) -> Result<&mut Self, GraphError> {
        let old = self.heap.edges[edge].tentacles.clone();
        let mut seen = vec![false; old.len()];
        let valid = permutation.len() == old.len()
            && permutation
                .iter()
                .all(|&i| i < seen.len() && !std::mem::replace(&mut seen[i], true));
        if !valid {
            return Err(GraphError::BadPermutation(permutation.to_vec()));
        }
        self.detach_tentacles(edge);
        self.heap.edges[edge].tentacles = permutation.iter().map(|&i| old[i]).collect();
        self.attach_tentacles(edge);
        Ok(self)
    }

    /// Hyperedge replacement: substitute `edge` by a copy of `rhs` whose
    /// external nodes are glued onto the edge's tentacles in order.
    pub fn replace_edge(
        &mut self,
        edge: Edge,
        rhs: &HeapConfiguration,
    ) -> Result<&mut Self, GraphError> {
        let tentacles = self.heap.edges[edge].tentacles.clone();
        if tentacles.len() != rhs.rank() {
            return Err(GraphError::ExternalCount {
                edge,
                tentacles: tentacles.len(),
                externals: rhs.rank(),
            });
        }
        self.remove_edge(edge);

        let mut mapping: FxHashMap<Node, Node> = rhs
            .externals()
            .iter()
            .copied()
            .zip(tentacles.iter().copied())
            .collect();
        for node in rhs.nodes() {
            if !mapping.contains_key(&node) {
                let copy = self.add_node(rhs.node_type(node));
                mapping.insert(node, copy);
            }
        }
        for node in rhs.nodes() {
            for (selector, target) in rhs.selectors(node) {
                self.add_selector(mapping[&node], *selector, mapping[target])?;
            }
        }
        for rhs_edge in rhs.edges() {
            let attached: SmallVec<[Node; 4]> = rhs
                .attached_nodes(rhs_edge)
                .iter()
                .map(|node| mapping[node])
                .collect();
            self.add_edge(rhs.label_of(rhs_edge).clone(), &attached)?;
        }
        for variable in rhs.variables() {
            self.add_variable(rhs.name_of(variable), mapping[&rhs.target_of(variable)]);
        }
        Ok(self)
    }

    /// Inverse of [`HeapBuilder::replace_edge`]: remove the image of `pattern`
    /// under `morphism` and add a `label` edge over the images of the
    /// pattern's external nodes.
    pub fn replace_matching(
        &mut self,
        morphism: &Morphism,
        pattern: &HeapConfiguration,
        label: impl Into<Nonterminal>,
    ) -> Result<Edge, GraphError> {
        let label = label.into();
        if label.rank() != pattern.rank() {
            return Err(GraphError::TentacleCount {
                rank: label.rank(),
                attached: pattern.rank(),
            });
        }
        for node in pattern.nodes() {
            for (selector, _) in pattern.selectors(node) {
                self.remove_selector(morphism.image(node), *selector)?;
            }
        }
        for edge in pattern.edges() {
            if let Some(image) = morphism.edge_image(edge) {
                self.remove_edge(image);
            }
        }
        for node in pattern.nodes() {
            if !pattern.is_external(node) {
                self.remove_node(morphism.image(node));
            }
        }
        let tentacles: SmallVec<[Node; 4]> = pattern
            .externals()
            .iter()
            .map(|node| morphism.image(*node))
            .collect();
        self.add_edge(label, &tentacles)
    }

    fn attach_tentacles(&mut self, edge: Edge) {
        let tentacles = self.heap.edges[edge].tentacles.clone();
        for (position, node) in tentacles.into_iter().enumerate() {
            self.heap.nodes[node].tentacles.push((edge, position));
        }
    }

    fn detach_tentacles(&mut self, edge: Edge) {
        let tentacles = self.heap.edges[edge].tentacles.clone();
        for node in tentacles {
            self.heap.nodes[node]
                .tentacles
                .retain(|(attached, _)| *attached != edge);
        }
    }

    // -- Compaction --------------------------------------------------------

    fn compact(&mut self) {
        let heap = &mut self.heap;
        if !(heap.nodes.has_tombstones()
            || heap.edges.has_tombstones()
            || heap.variables.has_tombstones())
        {
            return;
        }
        let nodes = heap.nodes.compact();
        let edges = heap.edges.compact();
        let variables = heap.variables.compact();
        let node = |n: Node| live(&nodes, n.raw(), "node");
        let edge = |e: Edge| live(&edges, e.raw(), "edge");
        let variable = |v: VariableEdge| live(&variables, v.raw(), "variable");

        for (_, info) in heap.nodes.iter_mut() {
            for (_, target) in info.selectors.iter_mut() {
                *target = node(*target);
            }
            for (_, source) in info.predecessors.iter_mut() {
                *source = node(*source);
            }
            for (attached, _) in info.tentacles.iter_mut() {
                *attached = edge(*attached);
            }
            for v in info.variables.iter_mut() {
                *v = variable(*v);
            }
        }
        for (_, info) in heap.edges.iter_mut() {
            for n in info.tentacles.iter_mut() {
                *n = node(*n);
            }
        }
        for (_, info) in heap.variables.iter_mut() {
            info.target = node(info.target);
        }
        for n in heap.externals.iter_mut() {
            *n = node(*n);
        }
    }
}

fn live<I: Copy + std::fmt::Debug>(mapping: &[Option<I>], raw: usize, kind: &str) -> I {
    match mapping.get(raw).copied().flatten() {
        Some(id) => id,
        None => panic!("live heap data refers to removed {kind} {raw}"),
    }
}
