use hyperheap_graph::ViolationPoints;

use crate::{ProgramCounter, ProgramState, SemanticsError};

/// The abstract semantics of one statement.
///
/// `C` is a context threaded through generation, e.g. the contracts of an
/// interprocedural analysis.
pub trait Semantics<C = ()> {
    /// Successor states of `state`. The heap of `state` satisfies
    /// [`Semantics::potential_violation_points`] as far as the grammar allows.
    fn compute_successors(
        &self,
        state: &ProgramState,
        ctx: &mut C,
    ) -> Result<Vec<ProgramState>, SemanticsError>;

    /// Selectors the statement dereferences, per variable.
    fn potential_violation_points(&self) -> ViolationPoints;

    fn needs_materialization(&self, state: &ProgramState) -> bool {
        self.potential_violation_points()
            .first_violation(state.heap())
            .is_some()
    }

    /// Whether successors of this statement may be abstracted.
    fn permits_canonicalization(&self) -> bool {
        true
    }

    /// Whether a state without successors at this statement is final.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Whether the statement leaves the current method.
    fn is_return(&self) -> bool {
        false
    }
}

/// A control flow graph of statements, indexed by program counter.
pub trait Program<C = ()> {
    fn statement(&self, pc: ProgramCounter) -> Option<&dyn Semantics<C>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C> Program<C> for Vec<Box<dyn Semantics<C>>> {
    fn statement(&self, pc: ProgramCounter) -> Option<&dyn Semantics<C>> {
        self.get(pc).map(|statement| statement.as_ref())
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}
