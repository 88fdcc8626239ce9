//! Heap hypergraphs, symbols, and hyperedge replacement grammars.

pub mod arena;
mod error;
mod grammar;
mod heap;
mod index;
pub mod intern;
mod morphism;
mod nonterminal;
pub mod reachability;
mod symbol;
mod violation;

pub use error::GraphError;
pub use grammar::{Grammar, GrammarBuilder};
pub use heap::{Edge, HeapBuilder, HeapConfiguration, Node, VariableEdge};
pub use index::{Index, IndexGrammar, IndexRule, IndexSymbol};
pub use morphism::{Morphism, MorphismKind, MorphismOptions, MorphismSearch};
pub use nonterminal::{IndexedNonterminal, Nonterminal};
pub use symbol::{
    CONSTANT_NAMES, Constants, FieldTable, Label, LabelId, NULL_NAME, NULL_TYPE, Name, Selector,
    SymbolId, SymbolTable, Type,
};
pub use violation::{Violation, ViolationPoints};
