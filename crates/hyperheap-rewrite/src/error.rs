use hyperheap_graph::{Edge, GraphError, IndexSymbol};

/// Failures while rewriting a heap with grammar or index rules.
///
/// None of these abort an analysis: materialization logs them and skips the
/// offending rule application.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// The rule manager cannot handle the label of this edge, e.g. an indexed
    /// edge in a grammar without indexed left-hand sides.
    #[error("unexpected nonterminal on edge {0:?}")]
    UnexpectedNonterminal(Edge),
    /// The trailing index symbol is concrete and cannot be materialized.
    #[error("cannot materialize concrete index symbol {0:?}")]
    CannotMaterialize(IndexSymbol),
    /// A grammar response was handed to an applier that does not handle its shape.
    #[error("grammar response of kind `{0}` is not supported by this applier")]
    WrongResponseType(&'static str),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
