//! Choosing and applying the grammar rules that resolve a violation point.

use std::sync::Arc;

use hyperheap_graph::{Edge, Grammar, HeapConfiguration, IndexSymbol, Nonterminal, Selector};
use indexmap::IndexMap;
use log::error;

use crate::RewriteError;
use crate::index_matcher::{IndexMatcher, Symbols};
use crate::index_rewrite::materialize_indices;

/// Rules that can replace one nonterminal edge.
#[derive(Clone, Debug)]
pub enum GrammarResponse {
    /// Right-hand sides of a plain nonterminal.
    Rules(Vec<HeapConfiguration>),
    /// Right-hand sides of an indexed nonterminal, grouped by the rewriting
    /// of the trailing index `symbol` they require. The empty key means the
    /// index is used as is.
    Indexed {
        symbol: Option<IndexSymbol>,
        by_materialization: IndexMap<Symbols, Vec<HeapConfiguration>>,
    },
}

impl GrammarResponse {
    fn kind(&self) -> &'static str {
        match self {
            GrammarResponse::Rules(_) => "rules",
            GrammarResponse::Indexed { .. } => "indexed",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GrammarResponse::Rules(rules) => rules.is_empty(),
            GrammarResponse::Indexed {
                by_materialization, ..
            } => by_materialization.values().all(Vec::is_empty),
        }
    }
}

/// Finds the rules that resolve a violation at a given tentacle.
#[derive(Clone, Debug)]
pub struct RuleManager {
    grammar: Arc<Grammar>,
    matcher: Option<IndexMatcher>,
}

impl RuleManager {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            matcher: None,
        }
    }

    pub fn indexed(grammar: Arc<Grammar>, matcher: IndexMatcher) -> Self {
        Self {
            grammar,
            matcher: Some(matcher),
        }
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Rules for `edge` whose right-hand side provides `selector` at the
    /// external node glued onto `tentacle`.
    pub fn rules_for(
        &self,
        heap: &HeapConfiguration,
        edge: Edge,
        tentacle: usize,
        selector: Selector,
    ) -> Result<GrammarResponse, RewriteError> {
        let resolves = |rhs: &HeapConfiguration| {
            rhs.external_at(tentacle)
                .is_some_and(|node| rhs.selector_target(node, selector).is_some())
        };
        let label = heap.label_of(edge);
        let (nonterminal, matcher) = match (label, &self.matcher) {
            (Nonterminal::Basic(_), _) => {
                let rules = self
                    .grammar
                    .right_hand_sides(label)
                    .iter()
                    .filter(|rhs| resolves(rhs))
                    .cloned()
                    .collect();
                return Ok(GrammarResponse::Rules(rules));
            }
            (Nonterminal::Indexed(nonterminal), Some(matcher)) => (nonterminal, matcher),
            (Nonterminal::Indexed(_), None) => return Err(RewriteError::UnexpectedNonterminal(edge)),
        };

        let mut by_materialization: IndexMap<Symbols, Vec<HeapConfiguration>> = IndexMap::new();
        for (lhs, rhs) in self.grammar.rules_for_label(nonterminal.label) {
            if !resolves(rhs) {
                continue;
            }
            let Some(lhs_index) = lhs.index() else {
                return Err(RewriteError::UnexpectedNonterminal(edge));
            };
            let Some(found) = matcher.compute_match(&nonterminal.index, lhs_index) else {
                continue;
            };
            let rhs = instantiate_rule(rhs, &found.instantiation)?;
            by_materialization
                .entry(found.materialization)
                .or_default()
                .push(rhs);
        }
        let symbol = nonterminal.index.last().filter(|s| s.is_abstract());
        Ok(GrammarResponse::Indexed {
            symbol,
            by_materialization,
        })
    }
}

/// Replace the index variable of every edge in `rhs` by `instantiation`.
fn instantiate_rule(
    rhs: &HeapConfiguration,
    instantiation: &[IndexSymbol],
) -> Result<HeapConfiguration, RewriteError> {
    let updates: Vec<(Edge, Nonterminal)> = rhs
        .edges()
        .filter_map(|edge| {
            let label = rhs.label_of(edge);
            let index = label.index()?;
            index
                .ends_with(IndexSymbol::Variable)
                .then(|| index.prolonged(instantiation).map(|i| (edge, label.with_index(i))))
        })
        .collect::<Result<_, _>>()?;
    let mut builder = rhs.clone().builder();
    for (edge, label) in updates {
        builder.replace_edge_label(edge, label)?;
    }
    Ok(builder.build())
}

/// Applies a [`GrammarResponse`] to a heap.
pub trait GrammarResponseApplier: Send + Sync {
    fn apply(
        &self,
        heap: &HeapConfiguration,
        edge: Edge,
        response: &GrammarResponse,
    ) -> Result<Vec<HeapConfiguration>, RewriteError>;
}

/// Replaces the edge by every right-hand side of a plain response.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultApplier;

impl GrammarResponseApplier for DefaultApplier {
    fn apply(
        &self,
        heap: &HeapConfiguration,
        edge: Edge,
        response: &GrammarResponse,
    ) -> Result<Vec<HeapConfiguration>, RewriteError> {
        match response {
            GrammarResponse::Rules(rules) => replace_with_each(heap, edge, rules),
            other => Err(RewriteError::WrongResponseType(other.kind())),
        }
    }
}

/// Rewrites indices first, then replaces the edge.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexedApplier;

impl GrammarResponseApplier for IndexedApplier {
    fn apply(
        &self,
        heap: &HeapConfiguration,
        edge: Edge,
        response: &GrammarResponse,
    ) -> Result<Vec<HeapConfiguration>, RewriteError> {
        let (symbol, by_materialization) = match response {
            GrammarResponse::Rules(rules) => return replace_with_each(heap, edge, rules),
            GrammarResponse::Indexed {
                symbol,
                by_materialization,
            } => (symbol, by_materialization),
        };
        let mut results = Vec::new();
        for (materialization, rules) in by_materialization {
            let materialized = match (materialization.is_empty(), symbol) {
                (true, _) => heap.clone(),
                (false, Some(symbol)) => {
                    match materialize_indices(heap.clone(), *symbol, materialization) {
                        Ok(materialized) => materialized,
                        Err(err) => {
                            error!("skipping index materialization: {err}");
                            continue;
                        }
                    }
                }
                (false, None) => {
                    error!("index materialization requested for an index without abstract symbol");
                    continue;
                }
            };
            results.extend(replace_with_each(&materialized, edge, rules)?);
        }
        Ok(results)
    }
}

fn replace_with_each(
    heap: &HeapConfiguration,
    edge: Edge,
    rules: &[HeapConfiguration],
) -> Result<Vec<HeapConfiguration>, RewriteError> {
    rules
        .iter()
        .map(|rhs| {
            let mut builder = heap.clone().builder();
            builder.replace_edge(edge, rhs)?;
            Ok(builder.build())
        })
        .collect()
}
