use std::hash::Hash;

/// Position of an entry in an [`Arena`](super::Arena).
///
/// Only the arena hands out ids (`next_id`, `alloc`). Ids are dense: the raw
/// value is the slot index, which `Arena::compact` relies on to renumber
/// nodes, edges and variables of a heap after removals.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(pub(crate) usize);

impl Id {
    /// return raw ID as usize
    pub fn raw(self) -> usize {
        self.0
    }
}

/// Typed view on an [`Id`]. Ordered so that ids can be sorted.
pub trait Identifier:
    Sized + Clone + Copy + Hash + Ord + std::fmt::Debug + PartialEq + Eq + From<Id> + Into<Id>
{
}

/// Declare an [`Identifier`] newtype such as `Node`, `Edge` or
/// `VariableEdge`. `raw()` exposes the dense slot index that compaction
/// mappings are indexed by.
#[macro_export(local_inner_macros)]
macro_rules! identifier {
    ($(#[$attr:meta])* struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) Id);

        impl $name {
            /// return raw ID as usize
            pub fn raw(self) -> usize {
                self.0.raw()
            }
        }

        impl From<Id> for $name {
            fn from(value: Id) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Id {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl crate::arena::Identifier for $name {}
    };
}
