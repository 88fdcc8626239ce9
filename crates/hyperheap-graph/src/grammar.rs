use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashSet;

use crate::{Constants, GraphError, HeapConfiguration, Label, Nonterminal, Selector};

/// A hyperedge replacement grammar.
///
/// Maps each left-hand side to its right-hand sides. Rules keep insertion
/// order, which is the order abstraction tries them in. Built once and then
/// shared read-only.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    rules: IndexMap<Nonterminal, Vec<HeapConfiguration>>,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    pub fn left_hand_sides(&self) -> impl Iterator<Item = &Nonterminal> {
        self.rules.keys()
    }

    pub fn right_hand_sides(&self, lhs: &Nonterminal) -> &[HeapConfiguration] {
        self.rules.get(lhs).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every `(lhs, rhs)` pair in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (&Nonterminal, &HeapConfiguration)> {
        self.rules
            .iter()
            .flat_map(|(lhs, rhs)| rhs.iter().map(move |rhs| (lhs, rhs)))
    }

    /// Rules whose left-hand side has the given base label, regardless of index.
    pub fn rules_for_label(&self, label: Label) -> impl Iterator<Item = (&Nonterminal, &HeapConfiguration)> {
        self.rules().filter(move |(lhs, _)| lhs.label() == label)
    }

    pub fn is_indexed(&self) -> bool {
        self.rules
            .keys()
            .any(|lhs| matches!(lhs, Nonterminal::Indexed(_)))
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Selectors that point at the null node in rules for a bottom index.
    ///
    /// A heap where such a selector points at the node of `null` encodes the
    /// end of an indexed structure; abstracting its index would lose that.
    pub fn null_pointer_guards(&self, constants: &Constants) -> FxHashSet<Selector> {
        let Some(null_type) = constants.null_type() else {
            return FxHashSet::default();
        };
        let mut guards = FxHashSet::default();
        for (lhs, rhs) in self.rules() {
            if !lhs.index().is_some_and(|index| index.has_concrete_index()) {
                continue;
            }
            for node in rhs.nodes() {
                for (selector, target) in rhs.selectors(node) {
                    if rhs.node_type(*target) == null_type {
                        guards.insert(*selector);
                    }
                }
            }
        }
        guards
    }
}

#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: IndexMap<Nonterminal, Vec<HeapConfiguration>>,
}

impl GrammarBuilder {
    /// Add `lhs -> rhs`. Right-hand sides isomorphic to an existing one are
    /// dropped.
    pub fn add_rule(
        mut self,
        lhs: impl Into<Nonterminal>,
        rhs: HeapConfiguration,
    ) -> Result<Self, GraphError> {
        let lhs = lhs.into();
        if lhs.rank() != rhs.rank() {
            return Err(GraphError::RuleRank {
                label: format!("{lhs:?}"),
                rank: lhs.rank(),
                externals: rhs.rank(),
            });
        }
        let right_hand_sides = self.rules.entry(lhs).or_default();
        if right_hand_sides.contains(&rhs) {
            debug!("dropping duplicate right-hand side of rank {}", rhs.rank());
        } else {
            right_hand_sides.push(rhs);
        }
        Ok(self)
    }

    pub fn build(self) -> Grammar {
        Grammar { rules: self.rules }
    }
}
