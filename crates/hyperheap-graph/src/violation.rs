use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::{HeapConfiguration, Name, Node, Selector};

/// Selectors a statement is about to dereference, per variable.
///
/// A heap satisfies a violation point `(x, sel)` if the node of `x` carries
/// a concrete `sel` selector, or if `x` is not present at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViolationPoints {
    points: IndexMap<Name, SmallVec<[Selector; 2]>>,
}

/// A variable node lacking a required selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Violation {
    pub variable: Name,
    pub node: Node,
    pub selector: Selector,
}

impl ViolationPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: Name, selector: Selector) -> Self {
        self.add(variable, selector);
        self
    }

    pub fn add(&mut self, variable: Name, selector: Selector) {
        let selectors = self.points.entry(variable).or_default();
        if !selectors.contains(&selector) {
            selectors.push(selector);
        }
    }

    pub fn extend(&mut self, other: &ViolationPoints) {
        for (variable, selector) in other.iter() {
            self.add(variable, selector);
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = Name> + '_ {
        self.points.keys().copied()
    }

    pub fn selectors_of(&self, variable: Name) -> &[Selector] {
        self.points.get(&variable).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Name, Selector)> + '_ {
        self.points
            .iter()
            .flat_map(|(name, selectors)| selectors.iter().map(move |s| (*name, *s)))
    }

    pub fn is_empty(&self) -> bool {
        self.points.values().all(SmallVec::is_empty)
    }

    /// Violations that are actually present in `heap`, in declaration order.
    pub fn violations<'a>(&'a self, heap: &'a HeapConfiguration) -> impl Iterator<Item = Violation> + 'a {
        self.iter().filter_map(|(variable, selector)| {
            let node = heap.variable_target(variable)?;
            heap.selector_target(node, selector)
                .is_none()
                .then_some(Violation {
                    variable,
                    node,
                    selector,
                })
        })
    }

    pub fn first_violation(&self, heap: &HeapConfiguration) -> Option<Violation> {
        self.violations(heap).next()
    }

    pub fn is_satisfied_by(&self, heap: &HeapConfiguration) -> bool {
        self.first_violation(heap).is_none()
    }
}
