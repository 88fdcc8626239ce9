//! Symbolic execution of programs over abstract heaps.
//!
//! A [`StateSpaceGenerator`] explores a [`Program`] from a set of initial
//! [`ProgramState`]s. Before a statement runs, the heap is materialized until
//! the statement's violation points are satisfied; afterwards, successors are
//! abstracted according to a [`CanonicalizationPolicy`] and merged into the
//! [`StateSpace`].

mod error;
mod generator;
mod semantics;
mod state;
mod state_space;
pub mod strategy;

pub use error::{GenerationError, SemanticsError};
pub use generator::{GeneratorConfig, StateSpaceGenerator};
pub use semantics::{Program, Semantics};
pub use state::{ABORTED, GARBAGE_COLLECTED, ProgramCounter, ProgramState, StateId, TERMINATED};
pub use state_space::{Insertion, StateSpace, TransitionKind};
pub use strategy::{CanonicalizationPolicy, ExplorationOrder};
