use std::sync::Arc;

use hyperheap_graph::{
    Grammar, HeapConfiguration, IndexGrammar, MorphismOptions, MorphismSearch, Nonterminal,
};
use log::{debug, error};

use crate::RewriteError;
use crate::embedding_index::EmbeddingIndexChecker;
use crate::index_matcher::IndexMatcher;
use crate::index_rewrite::{IndexAbstractionGuard, IndexCanonicalization, materialize_indices};

/// How strictly abstraction has to preserve concrete structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AbstractionMode {
    /// Embeddings honour the configured [`MorphismOptions`].
    #[default]
    Admissible,
    /// Embeddings ignore admissibility, e.g. for states leaving a method.
    Aggressive,
}

/// Abstracts heaps by folding rule right-hand sides into nonterminal edges.
pub trait HeapCanonicalization {
    fn canonicalize(&self, heap: HeapConfiguration, mode: AbstractionMode) -> HeapConfiguration;
}

#[derive(Clone, Debug)]
struct IndexSupport {
    matcher: IndexMatcher,
    abstraction: IndexCanonicalization,
}

/// Folds embeddings of right-hand sides until none is left, then abstracts
/// indices, and repeats until neither applies.
///
/// Rules are tried in grammar order and the first embedding found is folded,
/// so the result is canonical only for backward confluent grammars.
#[derive(Clone, Debug)]
pub struct CanonicalizationStrategy {
    grammar: Arc<Grammar>,
    options: MorphismOptions,
    index: Option<IndexSupport>,
    aggressive_threshold: Option<usize>,
}

#[bon::bon]
impl CanonicalizationStrategy {
    /// `index_grammar` enables indexed abstraction. Heaps with more than
    /// `aggressive_threshold` nodes are always abstracted aggressively.
    #[builder]
    pub fn new(
        grammar: Arc<Grammar>,
        #[builder(default)] options: MorphismOptions,
        index_grammar: Option<IndexGrammar>,
        guard: Option<Arc<dyn IndexAbstractionGuard>>,
        aggressive_threshold: Option<usize>,
    ) -> Self {
        let index = index_grammar.map(|index_grammar| {
            let mut abstraction = IndexCanonicalization::new(index_grammar.clone());
            if let Some(guard) = guard {
                abstraction = abstraction.with_guard(guard);
            }
            IndexSupport {
                matcher: IndexMatcher::new(index_grammar),
                abstraction,
            }
        });
        Self {
            grammar,
            options,
            index,
            aggressive_threshold,
        }
    }
}

impl CanonicalizationStrategy {
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn options(&self) -> &MorphismOptions {
        &self.options
    }

    /// Fold a single embedding, trying rules in grammar order.
    fn fold_once(
        &self,
        heap: &HeapConfiguration,
        options: Option<&MorphismOptions>,
    ) -> Result<Option<HeapConfiguration>, RewriteError> {
        for (lhs, rhs) in self.grammar.rules() {
            if !reduces(rhs) {
                continue;
            }
            let folded = match (&self.index, lhs) {
                (Some(index), Nonterminal::Indexed(_)) => self.fold_indexed(heap, lhs, rhs, options, index)?,
                _ => {
                    let mut search = MorphismSearch::embedding(rhs, heap);
                    if let Some(options) = options {
                        search = search.with_options(options);
                    }
                    match search.find_first() {
                        Some(morphism) => {
                            let mut builder = heap.clone().builder();
                            builder.replace_matching(&morphism, rhs, lhs.clone())?;
                            Some(builder.build())
                        }
                        None => None,
                    }
                }
            };
            if folded.is_some() {
                return Ok(folded);
            }
        }
        Ok(None)
    }

    fn fold_indexed(
        &self,
        heap: &HeapConfiguration,
        lhs: &Nonterminal,
        rhs: &HeapConfiguration,
        options: Option<&MorphismOptions>,
        index: &IndexSupport,
    ) -> Result<Option<HeapConfiguration>, RewriteError> {
        let same_base = |pattern: &Nonterminal, target: &Nonterminal| pattern.same_base(target);
        let checker = EmbeddingIndexChecker::new(&index.matcher);
        let mut search = MorphismSearch::embedding(rhs, heap).with_label_matcher(&same_base);
        if let Some(options) = options {
            search = search.with_options(options);
        }
        let mut matched = None;
        let Some(morphism) = search.find(|morphism| {
            matched = checker.check(morphism, rhs, heap, lhs);
            matched.is_some()
        }) else {
            return Ok(None);
        };
        let Some(matched) = matched else {
            return Ok(None);
        };

        let mut materialized = heap.clone();
        for (symbol, replacement) in &matched.materializations {
            materialized = materialize_indices(materialized, *symbol, replacement)?;
        }
        let mut builder = materialized.builder();
        builder.replace_matching(&morphism, rhs, matched.lhs)?;
        Ok(Some(builder.build()))
    }
}

impl HeapCanonicalization for CanonicalizationStrategy {
    fn canonicalize(&self, mut heap: HeapConfiguration, mode: AbstractionMode) -> HeapConfiguration {
        let aggressive = mode == AbstractionMode::Aggressive
            || self
                .aggressive_threshold
                .is_some_and(|threshold| heap.node_count() > threshold);
        let options = (!aggressive).then_some(&self.options);

        loop {
            match self.fold_once(&heap, options) {
                Ok(Some(folded)) => {
                    heap = folded;
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    error!("abstraction stopped early: {err}");
                    return heap;
                }
            }
            let Some(index) = &self.index else {
                return heap;
            };
            match index.abstraction.apply(heap.clone()) {
                Ok((abstracted, true)) => {
                    debug!("abstracted indices");
                    heap = abstracted;
                }
                Ok((_, false)) => return heap,
                Err(err) => {
                    error!("index abstraction failed: {err}");
                    return heap;
                }
            }
        }
    }
}

/// Folding `rhs` strictly shrinks a heap: it either removes a selector or
/// replaces at least two nodes and edges by one edge.
fn reduces(rhs: &HeapConfiguration) -> bool {
    let selectors: usize = rhs.nodes().map(|n| rhs.selectors(n).len()).sum();
    let internal = rhs.nodes().filter(|n| !rhs.is_external(*n)).count();
    selectors > 0 || internal + rhs.edge_count() >= 2
}
