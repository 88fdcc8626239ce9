use crate::{Edge, Node, Selector};

/// Errors raised while building symbols, heaps, and grammars.
///
/// All of these signal an inconsistent input and are reported at construction
/// time instead of being coerced.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A nonterminal was re-interned with a different rank or reduction tentacles.
    #[error("nonterminal `{name}` already declared with rank {declared}, requested rank {requested}")]
    RankMismatch {
        name: String,
        declared: usize,
        requested: usize,
    },
    /// Reduction tentacles are kept in a 64-bit set.
    #[error("nonterminal `{name}` has rank {rank}, at most 64 tentacles are supported")]
    RankTooLarge { name: String, rank: usize },
    /// A reduction flag list does not have one entry per tentacle.
    #[error("nonterminal `{name}` declared with rank {rank} but {flags} reduction flags")]
    ReductionArity {
        name: String,
        rank: usize,
        flags: usize,
    },
    /// An index symbol name was reused with a different kind.
    #[error("index symbol `{0}` already declared with a different kind")]
    SymbolKindConflict(String),
    /// Only the trailing symbol of an index may be abstract or a variable.
    #[error("only the trailing symbol of an index may be abstract or a variable")]
    MalformedIndex,
    /// A node already has an outgoing selector with this label.
    #[error("node {node:?} already has selector {selector:?}")]
    SelectorExists { node: Node, selector: Selector },
    /// A node lacks the selector an operation refers to.
    #[error("node {node:?} has no selector {selector:?}")]
    MissingSelector { node: Node, selector: Selector },
    /// A node that is still attached to edges cannot be removed as isolated.
    #[error("node {0:?} is not isolated")]
    NodeNotIsolated(Node),
    /// The number of attached nodes does not match the label rank.
    #[error("edge label has rank {rank} but {attached} nodes were attached")]
    TentacleCount { rank: usize, attached: usize },
    /// A replacement graph does not expose one external node per tentacle.
    #[error("edge {edge:?} has {tentacles} tentacles but the replacement has {externals} external nodes")]
    ExternalCount {
        edge: Edge,
        tentacles: usize,
        externals: usize,
    },
    /// A grammar rule whose right-hand side does not fit its left-hand side.
    #[error("rule for `{label}` has rank {rank} but its right-hand side has {externals} external nodes")]
    RuleRank {
        label: String,
        rank: usize,
        externals: usize,
    },
    /// A tentacle permutation that is not a bijection on `0..rank`.
    #[error("{0:?} is not a permutation of the edge tentacles")]
    BadPermutation(Vec<usize>),
}
