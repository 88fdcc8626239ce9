//! Uniform rewriting of the trailing symbol of every index in a heap.

use std::sync::Arc;

use hyperheap_graph::{
    Edge, GraphError, HeapConfiguration, Index, IndexGrammar, IndexRule, IndexSymbol, Name,
    Nonterminal, Selector,
};
use log::debug;
use rustc_hash::FxHashSet;

use crate::RewriteError;

/// Replace the trailing `symbol` of every indexed edge by `replacement`.
///
/// All edges are rewritten together, which keeps the indices of a heap
/// consistent with each other.
pub fn materialize_indices(
    heap: HeapConfiguration,
    symbol: IndexSymbol,
    replacement: &[IndexSymbol],
) -> Result<HeapConfiguration, RewriteError> {
    if !symbol.is_abstract() {
        return Err(RewriteError::CannotMaterialize(symbol));
    }
    relabel(heap, |index| {
        index
            .ends_with(symbol)
            .then(|| index.prolonged(replacement))
            .transpose()
    })
}

/// Relabel every indexed edge for which `rewrite` returns a new index.
fn relabel(
    heap: HeapConfiguration,
    mut rewrite: impl FnMut(&Index) -> Result<Option<Index>, GraphError>,
) -> Result<HeapConfiguration, RewriteError> {
    let updates: Vec<(Edge, Nonterminal)> = heap
        .edges()
        .filter_map(|edge| {
            let label = heap.label_of(edge);
            let index = label.index()?;
            match rewrite(index) {
                Ok(Some(new_index)) => Some(Ok((edge, label.with_index(new_index)))),
                Ok(None) => None,
                Err(err) => Some(Err(err)),
            }
        })
        .collect::<Result<_, _>>()?;
    if updates.is_empty() {
        return Ok(heap);
    }
    let mut builder = heap.builder();
    for (edge, label) in updates {
        builder.replace_edge_label(edge, label)?;
    }
    Ok(builder.build())
}

/// Decides whether index abstraction may run on a heap.
pub trait IndexAbstractionGuard: Send + Sync {
    fn permits(&self, heap: &HeapConfiguration) -> bool;
}

impl<F> IndexAbstractionGuard for F
where
    F: Fn(&HeapConfiguration) -> bool + Send + Sync,
{
    fn permits(&self, heap: &HeapConfiguration) -> bool {
        self(heap)
    }
}

/// Blocks index abstraction while a guard selector points at the null node.
///
/// Guard selectors are the ones that end an indexed structure at `null`
/// (see `Grammar::null_pointer_guards`). Abstracting the index of such a
/// heap would forget that the structure ends there.
#[derive(Clone, Debug)]
pub struct NullPointerGuard {
    selectors: FxHashSet<Selector>,
    null: Name,
}

impl NullPointerGuard {
    pub fn new(selectors: FxHashSet<Selector>, null: Name) -> Self {
        Self { selectors, null }
    }
}

impl IndexAbstractionGuard for NullPointerGuard {
    fn permits(&self, heap: &HeapConfiguration) -> bool {
        let Some(null) = heap.variable_target(self.null) else {
            return true;
        };
        !heap.predecessors(null).iter().any(|(selector, _)| self.selectors.contains(selector))
    }
}

/// Folds index suffixes back into abstract symbols: `Z -> X`, `sX -> X`,
/// and likewise for every rule of the index grammar.
#[derive(Clone)]
pub struct IndexCanonicalization {
    grammar: IndexGrammar,
    guard: Option<Arc<dyn IndexAbstractionGuard>>,
}

impl std::fmt::Debug for IndexCanonicalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCanonicalization")
            .field("grammar", &self.grammar)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

#[derive(Clone, Copy, Debug)]
enum Step {
    /// `base -> abstract`
    Base,
    /// `step abstract -> abstract`
    Recursive,
}

impl IndexCanonicalization {
    pub fn new(grammar: IndexGrammar) -> Self {
        Self {
            grammar,
            guard: None,
        }
    }

    pub fn with_guard(mut self, guard: Arc<dyn IndexAbstractionGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Abstract indices until no step applies. Returns the heap unchanged if
    /// the guard forbids abstraction.
    pub fn canonicalize(&self, heap: HeapConfiguration) -> Result<HeapConfiguration, RewriteError> {
        self.apply(heap).map(|(heap, _)| heap)
    }

    /// Like [`Self::canonicalize`], also reporting whether any index changed.
    pub fn apply(&self, mut heap: HeapConfiguration) -> Result<(HeapConfiguration, bool), RewriteError> {
        if self.guard.as_ref().is_some_and(|guard| !guard.permits(&heap)) {
            debug!("index abstraction blocked by guard");
            return Ok((heap, false));
        }
        let mut changed = false;
        loop {
            let mut applied = false;
            for rule in self.grammar.rules() {
                for step in [Step::Base, Step::Recursive] {
                    let (next, stepped) = self.attempt(heap, rule, step)?;
                    heap = next;
                    applied |= stepped;
                }
            }
            if !applied {
                return Ok((heap, changed));
            }
            changed = true;
        }
    }

    /// Apply one abstraction step to all applicable edges, provided every
    /// indexed edge of the heap allows it.
    fn attempt(
        &self,
        heap: HeapConfiguration,
        rule: &IndexRule,
        step: Step,
    ) -> Result<(HeapConfiguration, bool), RewriteError> {
        let mut applicable = false;
        let edges: Vec<_> = heap.edges().collect();
        for edge in edges {
            let Some(index) = heap.label_of(edge).index() else {
                continue;
            };
            let last = index.last();
            let possible = match step {
                Step::Base => last != Some(rule.abstract_symbol),
                Step::Recursive => {
                    last != Some(rule.base)
                        && (last != Some(rule.abstract_symbol)
                            || (index.len() > 1
                                && index.symbols()[index.len() - 2] == rule.step))
                }
            };
            if !possible {
                return Ok((heap, false));
            }
            applicable |= match step {
                Step::Base => last == Some(rule.base),
                Step::Recursive => last == Some(rule.abstract_symbol) && index.len() > 1,
            };
        }
        if !applicable {
            return Ok((heap, false));
        }
        let heap = relabel(heap, |index| {
            let last = index.last();
            Ok(match step {
                Step::Base if last == Some(rule.base) => Some(index.prolonged(&[rule.abstract_symbol])?),
                Step::Recursive if last == Some(rule.abstract_symbol) && index.len() > 1 => {
                    Some(index.shortened().prolonged(&[rule.abstract_symbol])?)
                }
                _ => None,
            })
        })?;
        Ok((heap, true))
    }
}
