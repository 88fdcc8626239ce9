//! Grammar-driven rewriting of heap configurations.
//!
//! [`MaterializationStrategy`] replaces nonterminal edges by right-hand
//! sides until a set of [`ViolationPoints`](hyperheap_graph::ViolationPoints)
//! is satisfied. [`CanonicalizationStrategy`] goes the other way and folds
//! embedded right-hand sides back into nonterminal edges.

mod canonicalization;
mod embedding_index;
mod error;
mod index_matcher;
mod index_rewrite;
mod materialization;
mod rules;

pub use canonicalization::{AbstractionMode, CanonicalizationStrategy, HeapCanonicalization};
pub use embedding_index::{EmbeddingIndexChecker, EmbeddingIndexMatch};
pub use error::RewriteError;
pub use index_matcher::{IndexMatch, IndexMatcher, Symbols};
pub use index_rewrite::{
    IndexAbstractionGuard, IndexCanonicalization, NullPointerGuard, materialize_indices,
};
pub use materialization::{HeapMaterialization, MaterializationStrategy, MaterializeResult};
pub use rules::{
    DefaultApplier, GrammarResponse, GrammarResponseApplier, IndexedApplier, RuleManager,
};
