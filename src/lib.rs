//! Shape analysis of heap-manipulating programs with hyperedge replacement
//! grammars.
//!
//! Heaps are hypergraphs ([`graph`]), abstracted and concretized by grammar
//! rules ([`rewrite`]), explored statement by statement ([`statespace`]) and
//! summarized per method ([`procedures`]).

pub use hyperheap_graph as graph;
pub use hyperheap_rewrite as rewrite;
pub use hyperheap_statespace as statespace;

#[cfg(feature = "procedures")]
pub use hyperheap_procedures as procedures;

pub mod prelude {
    pub use hyperheap_graph::*;
    #[cfg(feature = "procedures")]
    pub use hyperheap_procedures::*;
    pub use hyperheap_rewrite::*;
    pub use hyperheap_statespace::*;
}
