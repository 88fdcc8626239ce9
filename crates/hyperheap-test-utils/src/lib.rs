#[cfg(feature = "balanced-tree")]
mod balanced_tree;
#[cfg(feature = "list")]
mod list;
#[cfg(feature = "toy-semantics")]
pub mod toy;

#[cfg(feature = "balanced-tree")]
pub use balanced_tree::BalancedTreeFixture;
#[cfg(feature = "list")]
pub use list::ListFixture;
