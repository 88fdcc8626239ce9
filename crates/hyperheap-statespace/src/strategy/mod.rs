//! Pluggable parts of a [`StateSpaceGenerator`](crate::StateSpaceGenerator).

mod abort;
mod canonicalization;
mod post_processing;
mod refinement;

pub use abort::{AbortStrategy, NeverAbort, StateSpaceBoundedAbortStrategy};
pub use canonicalization::CanonicalizationPolicy;
pub use post_processing::{FinalStateCoalescing, NoPostProcessing, PostProcessingStrategy};
pub use refinement::{GarbageCollector, StateRefinementStrategy};

use crate::{ProgramState, StateSpace};

/// Order in which unexplored states are taken from the frontier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExplorationOrder {
    #[default]
    DepthFirst,
    BreadthFirst,
}

/// Assigns atomic propositions to a state before it is inserted.
pub trait StateLabelingStrategy {
    fn label(&self, state: &mut ProgramState);
}

impl<F> StateLabelingStrategy for F
where
    F: Fn(&mut ProgramState),
{
    fn label(&self, state: &mut ProgramState) {
        self(state)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoLabeling;

impl StateLabelingStrategy for NoLabeling {
    fn label(&self, _state: &mut ProgramState) {}
}

/// Decides whether a newly discovered state is explored further.
pub trait ExplorationStrategy {
    fn check(&self, state: &ProgramState, space: &StateSpace) -> bool;
}

impl<F> ExplorationStrategy for F
where
    F: Fn(&ProgramState, &StateSpace) -> bool,
{
    fn check(&self, state: &ProgramState, space: &StateSpace) -> bool {
        self(state, space)
    }
}

/// Explores every state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExhaustiveExploration;

impl ExplorationStrategy for ExhaustiveExploration {
    fn check(&self, _state: &ProgramState, _space: &StateSpace) -> bool {
        true
    }
}

/// Decides whether an explored state is final.
pub trait FinalStateStrategy {
    /// `terminal` tells whether the state's statement is terminal.
    fn is_final(&self, state: &ProgramState, successors: &[ProgramState], terminal: bool) -> bool;
}

/// States at terminal statements without successors are final.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalStatementFinalState;

impl FinalStateStrategy for TerminalStatementFinalState {
    fn is_final(&self, _state: &ProgramState, successors: &[ProgramState], terminal: bool) -> bool {
        terminal && successors.is_empty()
    }
}

/// Creates the state space a fresh generation fills.
pub trait StateSpaceSupplier {
    fn supply(&self) -> StateSpace;
}

impl<F> StateSpaceSupplier for F
where
    F: Fn() -> StateSpace,
{
    fn supply(&self) -> StateSpace {
        self()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyStateSpace;

impl StateSpaceSupplier for EmptyStateSpace {
    fn supply(&self) -> StateSpace {
        StateSpace::new()
    }
}
