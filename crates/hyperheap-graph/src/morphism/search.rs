use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::{Morphism, MorphismKind, MorphismOptions};
use crate::{Edge, HeapConfiguration, Name, Node, Nonterminal, Selector};

/// How a pattern node was reached from an earlier node in the search order.
#[derive(Clone, Copy, Debug)]
enum Anchor {
    None,
    /// `from --selector--> node`
    Successor { from: Node, selector: Selector },
    /// `node --selector--> to`
    Predecessor { to: Node, selector: Selector },
    /// Shares a nonterminal edge with `neighbour`.
    Neighbour(Node),
}

#[derive(Clone, Copy, Debug)]
struct Step {
    node: Node,
    anchor: Anchor,
}

#[derive(Default)]
struct Partial {
    nodes: FxHashMap<Node, Node>,
    used_nodes: FxHashSet<Node>,
    edges: FxHashMap<Edge, Edge>,
    used_edges: FxHashSet<Edge>,
}

/// Backtracking search for morphisms from `pattern` into `target`.
///
/// Nodes are matched first, in breadth-first order from the pattern's
/// external nodes, so that most candidates are derived from an already
/// matched neighbour. Nonterminal edges are matched once all nodes are.
pub struct MorphismSearch<'a> {
    pattern: &'a HeapConfiguration,
    target: &'a HeapConfiguration,
    kind: MorphismKind,
    options: Option<&'a MorphismOptions>,
    labels: Option<&'a dyn Fn(&Nonterminal, &Nonterminal) -> bool>,
}

impl<'a> MorphismSearch<'a> {
    pub fn embedding(pattern: &'a HeapConfiguration, target: &'a HeapConfiguration) -> Self {
        Self::new(pattern, target, MorphismKind::Embedding)
    }

    /// Isomorphism respecting the order of external nodes.
    pub fn isomorphism(pattern: &'a HeapConfiguration, target: &'a HeapConfiguration) -> Self {
        Self::new(
            pattern,
            target,
            MorphismKind::Isomorphism {
                ordered_externals: true,
            },
        )
    }

    pub fn new(
        pattern: &'a HeapConfiguration,
        target: &'a HeapConfiguration,
        kind: MorphismKind,
    ) -> Self {
        Self {
            pattern,
            target,
            kind,
            options: None,
            labels: None,
        }
    }

    pub fn with_options(mut self, options: &'a MorphismOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Replace label equality by a custom compatibility check
    /// `(pattern label, target label)`.
    pub fn with_label_matcher(mut self, labels: &'a dyn Fn(&Nonterminal, &Nonterminal) -> bool) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn find_first(&self) -> Option<Morphism> {
        self.find(|_| true)
    }

    pub fn exists(&self) -> bool {
        self.find_first().is_some()
    }

    /// Enumerate morphisms until `accept` returns true for one of them.
    pub fn find(&self, mut accept: impl FnMut(&Morphism) -> bool) -> Option<Morphism> {
        if !self.sizes_compatible() {
            return None;
        }
        let order = self.search_order();
        let edges: Vec<Edge> = self.pattern.edges().collect();
        let mut partial = Partial::default();
        self.match_nodes(&order, 0, &edges, &mut partial, &mut accept)
    }

    fn sizes_compatible(&self) -> bool {
        let (p, t) = (self.pattern, self.target);
        match self.kind {
            MorphismKind::Embedding => {
                p.node_count() <= t.node_count() && p.edge_count() <= t.edge_count()
            }
            MorphismKind::Isomorphism { .. } => {
                p.node_count() == t.node_count()
                    && p.edge_count() == t.edge_count()
                    && p.variable_count() == t.variable_count()
                    && p.rank() == t.rank()
            }
        }
    }

    fn search_order(&self) -> Vec<Step> {
        let pattern = self.pattern;
        let mut order = Vec::with_capacity(pattern.node_count());
        let mut seen = FxHashSet::default();
        let roots = pattern
            .externals()
            .iter()
            .copied()
            .chain(pattern.nodes())
            .collect::<Vec<_>>();

        for root in roots {
            if !seen.insert(root) {
                continue;
            }
            order.push(Step {
                node: root,
                anchor: Anchor::None,
            });
            let mut queue = VecDeque::from([root]);
            while let Some(node) = queue.pop_front() {
                let mut reach = |next: Node, anchor: Anchor, queue: &mut VecDeque<Node>| {
                    if seen.insert(next) {
                        order.push(Step { node: next, anchor });
                        queue.push_back(next);
                    }
                };
                for (selector, target) in pattern.selectors(node) {
                    let anchor = Anchor::Successor {
                        from: node,
                        selector: *selector,
                    };
                    reach(*target, anchor, &mut queue);
                }
                for (selector, source) in pattern.predecessors(node) {
                    let anchor = Anchor::Predecessor {
                        to: node,
                        selector: *selector,
                    };
                    reach(*source, anchor, &mut queue);
                }
                for edge in pattern.attached_edges(node) {
                    for other in pattern.attached_nodes(edge) {
                        reach(*other, Anchor::Neighbour(node), &mut queue);
                    }
                }
            }
        }
        order
    }

    fn candidates(&self, step: &Step, partial: &Partial) -> SmallVec<[Node; 8]> {
        let target = self.target;
        if let MorphismKind::Isomorphism {
            ordered_externals: true,
        } = self.kind
        {
            if let Some(position) = self.pattern.external_index_of(step.node) {
                return target.external_at(position).into_iter().collect();
            }
        }
        match step.anchor {
            Anchor::None => target.nodes().collect(),
            Anchor::Successor { from, selector } => target
                .selector_target(partial.nodes[&from], selector)
                .into_iter()
                .collect(),
            Anchor::Predecessor { to, selector } => target
                .predecessors(partial.nodes[&to])
                .iter()
                .filter(|(label, _)| *label == selector)
                .map(|(_, source)| *source)
                .collect(),
            Anchor::Neighbour(neighbour) => {
                let mut nodes = SmallVec::new();
                for edge in target.attached_edges(partial.nodes[&neighbour]) {
                    for node in target.attached_nodes(edge) {
                        if !nodes.contains(node) {
                            nodes.push(*node);
                        }
                    }
                }
                nodes
            }
        }
    }

    fn match_nodes(
        &self,
        order: &[Step],
        depth: usize,
        edges: &[Edge],
        partial: &mut Partial,
        accept: &mut impl FnMut(&Morphism) -> bool,
    ) -> Option<Morphism> {
        let Some(step) = order.get(depth) else {
            return self.match_edges(edges, 0, partial, accept);
        };
        for candidate in self.candidates(step, partial) {
            if !self.feasible(step.node, candidate, partial) {
                continue;
            }
            partial.nodes.insert(step.node, candidate);
            partial.used_nodes.insert(candidate);
            if let Some(found) = self.match_nodes(order, depth + 1, edges, partial, accept) {
                return Some(found);
            }
            partial.nodes.remove(&step.node);
            partial.used_nodes.remove(&candidate);
        }
        None
    }

    fn match_edges(
        &self,
        edges: &[Edge],
        depth: usize,
        partial: &mut Partial,
        accept: &mut impl FnMut(&Morphism) -> bool,
    ) -> Option<Morphism> {
        let Some(&edge) = edges.get(depth) else {
            let morphism = Morphism::new(partial.nodes.clone(), partial.edges.clone());
            return accept(&morphism).then_some(morphism);
        };
        let images: SmallVec<[Node; 4]> = self
            .pattern
            .attached_nodes(edge)
            .iter()
            .map(|node| partial.nodes[node])
            .collect();
        let candidates: SmallVec<[Edge; 4]> = match images.first() {
            Some(first) => self.target.attached_edges(*first),
            None => self.target.edges().collect(),
        };
        for candidate in candidates {
            if partial.used_edges.contains(&candidate)
                || self.target.attached_nodes(candidate) != images.as_slice()
                || !self.labels_match(self.pattern.label_of(edge), self.target.label_of(candidate))
            {
                continue;
            }
            partial.edges.insert(edge, candidate);
            partial.used_edges.insert(candidate);
            if let Some(found) = self.match_edges(edges, depth + 1, partial, accept) {
                return Some(found);
            }
            partial.edges.remove(&edge);
            partial.used_edges.remove(&candidate);
        }
        None
    }

    fn labels_match(&self, pattern: &Nonterminal, target: &Nonterminal) -> bool {
        match self.labels {
            Some(labels) => labels(pattern, target),
            None => pattern == target,
        }
    }

    fn feasible(&self, p: Node, t: Node, partial: &Partial) -> bool {
        let (pattern, target) = (self.pattern, self.target);
        if partial.used_nodes.contains(&t) || pattern.node_type(p) != target.node_type(t) {
            return false;
        }

        let degrees = |heap: &HeapConfiguration, n: Node| {
            (
                heap.selectors(n).len(),
                heap.predecessors(n).len(),
                heap.tentacles_at(n).len(),
            )
        };
        let (p_degree, t_degree) = (degrees(pattern, p), degrees(target, t));
        let p_names = sorted_names(pattern, p);
        let t_names = sorted_names(target, t);

        match self.kind {
            MorphismKind::Isomorphism { ordered_externals } => {
                if p_degree != t_degree || p_names != t_names {
                    return false;
                }
                let external_ok = if ordered_externals {
                    pattern.external_index_of(p) == target.external_index_of(t)
                } else {
                    pattern.is_external(p) == target.is_external(t)
                };
                if !external_ok {
                    return false;
                }
            }
            MorphismKind::Embedding => {
                if pattern.is_external(p) {
                    let covered = p_degree.0 <= t_degree.0
                        && p_degree.1 <= t_degree.1
                        && p_degree.2 <= t_degree.2
                        && p_names.iter().all(|name| t_names.contains(name));
                    if !covered {
                        return false;
                    }
                } else if p_degree != t_degree || p_names != t_names || target.is_external(t) {
                    return false;
                }
                if let Some(options) = self.options {
                    if options.admissible_abstraction()
                        && !pattern.selectors(p).is_empty()
                        && !self.admissible(t, options)
                    {
                        return false;
                    }
                }
            }
        }

        for (selector, next) in pattern.selectors(p) {
            let Some(image) = target.selector_target(t, *selector) else {
                return false;
            };
            if target.node_type(image) != pattern.node_type(*next) {
                return false;
            }
            let expected = if *next == p {
                Some(t)
            } else {
                partial.nodes.get(next).copied()
            };
            if expected.is_some_and(|expected| expected != image) {
                return false;
            }
        }
        for (selector, source) in pattern.predecessors(p) {
            if let Some(image) = partial.nodes.get(source) {
                if target.selector_target(*image, *selector) != Some(t) {
                    return false;
                }
            }
        }
        true
    }

    /// Whether abstracting selectors away from `t` keeps the heap admissible.
    fn admissible(&self, t: Node, options: &MorphismOptions) -> bool {
        let target = self.target;
        let constants = options.constants();
        let ignore_constants = !options.admissible_constants();
        if target.is_external(t)
            && !(ignore_constants && constants.is_constant_type(target.node_type(t)))
        {
            return false;
        }
        target.attached_variables(t).iter().all(|variable| {
            ignore_constants && constants.is_constant_name(target.name_of(*variable))
        })
    }
}

fn sorted_names(heap: &HeapConfiguration, node: Node) -> SmallVec<[Name; 2]> {
    let mut names = heap.variable_names(node);
    names.sort_unstable();
    names
}
