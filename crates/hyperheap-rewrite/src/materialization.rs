use std::sync::Arc;

use hyperheap_graph::{Grammar, HeapConfiguration, IndexGrammar, Violation, ViolationPoints};
use log::{debug, error};

use crate::index_matcher::IndexMatcher;
use crate::rules::{DefaultApplier, GrammarResponseApplier, IndexedApplier, RuleManager};

/// Outcome of [`HeapMaterialization::materialize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterializeResult {
    /// One heap per rule choice, each satisfying all violation points.
    Resolved(Vec<HeapConfiguration>),
    /// The heap already satisfies all violation points.
    Satisfied,
    /// Some violation point cannot be resolved by any rule.
    NoRuleApplicable,
}

impl MaterializeResult {
    /// The materialized heaps; empty unless resolved.
    pub fn into_heaps(self) -> Vec<HeapConfiguration> {
        match self {
            MaterializeResult::Resolved(heaps) => heaps,
            MaterializeResult::Satisfied | MaterializeResult::NoRuleApplicable => Vec::new(),
        }
    }
}

/// Concretizes abstract heap parts on demand.
pub trait HeapMaterialization {
    fn materialize(&self, heap: &HeapConfiguration, points: &ViolationPoints) -> MaterializeResult;
}

/// Resolves violation points by replacing nonterminal edges with grammar
/// rules until every violation point is satisfied.
pub struct MaterializationStrategy {
    manager: RuleManager,
    applier: Box<dyn GrammarResponseApplier>,
}

impl std::fmt::Debug for MaterializationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializationStrategy")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl MaterializationStrategy {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            manager: RuleManager::new(grammar),
            applier: Box::new(DefaultApplier),
        }
    }

    // -- Builder methods ---------------------------------------------------

    /// Resolve indexed nonterminals with the given index grammar.
    pub fn with_indexed(mut self, index_grammar: IndexGrammar) -> Self {
        let grammar = self.manager.grammar().clone();
        self.manager = RuleManager::indexed(grammar, IndexMatcher::new(index_grammar));
        self.applier = Box::new(IndexedApplier);
        self
    }

    pub fn with_applier(mut self, applier: Box<dyn GrammarResponseApplier>) -> Self {
        self.applier = applier;
        self
    }

    /// One-step resolution of `violation`: the results of the first attached
    /// edge for which some rule applies.
    fn resolve(&self, heap: &HeapConfiguration, violation: &Violation) -> Vec<HeapConfiguration> {
        for (edge, tentacle) in heap.tentacles_at(violation.node) {
            let response = match self
                .manager
                .rules_for(heap, *edge, *tentacle, violation.selector)
            {
                Ok(response) => response,
                Err(err) => {
                    error!("rule manager cannot handle edge {edge:?}: {err}");
                    continue;
                }
            };
            if response.is_empty() {
                continue;
            }
            match self.applier.apply(heap, *edge, &response) {
                Ok(results) if !results.is_empty() => return results,
                Ok(_) => {}
                Err(err) => error!("rule applier rejected the grammar response: {err}"),
            }
        }
        Vec::new()
    }
}

impl HeapMaterialization for MaterializationStrategy {
    fn materialize(&self, heap: &HeapConfiguration, points: &ViolationPoints) -> MaterializeResult {
        let mut results = Vec::new();
        let mut worklist = vec![heap.clone()];
        let mut applied = false;

        while let Some(current) = worklist.pop() {
            match points.first_violation(&current) {
                None if applied => results.push(current),
                None => {}
                Some(violation) => {
                    applied = true;
                    let resolved = self.resolve(&current, &violation);
                    if resolved.is_empty() {
                        debug!("no rule resolves violation {violation:?}");
                    }
                    worklist.extend(resolved);
                }
            }
        }

        match (applied, results.is_empty()) {
            (false, _) => MaterializeResult::Satisfied,
            (true, true) => MaterializeResult::NoRuleApplicable,
            (true, false) => {
                debug!("materialization produced {} heaps", results.len());
                MaterializeResult::Resolved(results)
            }
        }
    }
}
