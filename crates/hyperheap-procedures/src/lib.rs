//! Contract-based analysis of (recursive) procedures.
//!
//! At a [`Call`], the part of the heap the callee can reach is cut out by
//! [`extract_scope`] and looked up in the callee's [`ContractCollection`].
//! Unknown preconditions become [`ProcedureCall`]s, which the
//! [`InterproceduralAnalysis`] executes until the contracts of all methods are
//! stable.

macro_rules! arena_id {
    ($(#[$attr:meta])* struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(hyperheap_graph::arena::Id);

        impl $name {
            /// return raw ID as usize
            pub fn raw(self) -> usize {
                self.0.raw()
            }
        }

        impl From<hyperheap_graph::arena::Id> for $name {
            fn from(value: hyperheap_graph::arena::Id) -> Self {
                Self(value)
            }
        }

        impl From<$name> for hyperheap_graph::arena::Id {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl hyperheap_graph::arena::Identifier for $name {}
    };
}

mod analysis;
mod call;
mod context;
mod contract;
mod error;
mod method;
mod scope;

pub use analysis::InterproceduralAnalysis;
pub use call::Call;
pub use context::{CallId, Dependency, ProcedureCall, ProcedureContext};
pub use contract::{Contract, ContractCollection, ContractLookup};
pub use error::ProcedureError;
pub use method::{Method, MethodBody, MethodId};
pub use scope::{ScopedHeap, extract_scope};
