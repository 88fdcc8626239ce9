//! Minimal statements for driving state space generation in tests.

use hyperheap_graph::{Name, Selector, ViolationPoints};
use hyperheap_statespace::{ProgramCounter, ProgramState, Semantics, SemanticsError};
use rustc_hash::FxHashSet;

/// Does nothing.
pub struct Skip {
    pub next: ProgramCounter,
}

impl<C> Semantics<C> for Skip {
    fn compute_successors(&self, state: &ProgramState, _ctx: &mut C) -> Result<Vec<ProgramState>, SemanticsError> {
        Ok(vec![state.successor(self.next, state.heap().clone())])
    }

    fn potential_violation_points(&self) -> ViolationPoints {
        ViolationPoints::new()
    }
}

/// Continues nondeterministically at every target.
pub struct Branch {
    pub targets: Vec<ProgramCounter>,
}

impl<C> Semantics<C> for Branch {
    fn compute_successors(&self, state: &ProgramState, _ctx: &mut C) -> Result<Vec<ProgramState>, SemanticsError> {
        Ok(self
            .targets
            .iter()
            .map(|pc| state.successor(*pc, state.heap().clone()))
            .collect())
    }

    fn potential_violation_points(&self) -> ViolationPoints {
        ViolationPoints::new()
    }
}

/// Leaves the method, dropping its local variables.
pub struct Return {
    pub next: ProgramCounter,
    pub locals: FxHashSet<Name>,
}

impl Return {
    pub fn new(next: ProgramCounter, locals: impl IntoIterator<Item = Name>) -> Self {
        Self {
            next,
            locals: locals.into_iter().collect(),
        }
    }
}

impl<C> Semantics<C> for Return {
    fn compute_successors(&self, state: &ProgramState, _ctx: &mut C) -> Result<Vec<ProgramState>, SemanticsError> {
        let mut builder = state.heap().clone().builder();
        for local in &self.locals {
            builder.remove_variable_named(*local);
        }
        Ok(vec![state.successor(self.next, builder.build())])
    }

    fn potential_violation_points(&self) -> ViolationPoints {
        ViolationPoints::new()
    }

    fn is_return(&self) -> bool {
        true
    }
}

/// End of the program.
pub struct Terminal;

impl<C> Semantics<C> for Terminal {
    fn compute_successors(&self, _state: &ProgramState, _ctx: &mut C) -> Result<Vec<ProgramState>, SemanticsError> {
        Ok(Vec::new())
    }

    fn potential_violation_points(&self) -> ViolationPoints {
        ViolationPoints::new()
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

/// `lhs = rhs.selector`
pub struct FieldAccess {
    pub lhs: Name,
    pub rhs: Name,
    pub selector: Selector,
    pub next: ProgramCounter,
}

impl<C> Semantics<C> for FieldAccess {
    fn compute_successors(&self, state: &ProgramState, _ctx: &mut C) -> Result<Vec<ProgramState>, SemanticsError> {
        let heap = state.heap();
        let target = heap
            .variable_target(self.rhs)
            .and_then(|node| heap.selector_target(node, self.selector))
            .ok_or(SemanticsError::NotSufficientlyMaterialized { pc: state.pc() })?;
        let mut builder = heap.clone().builder();
        builder.add_variable(self.lhs, target);
        Ok(vec![state.successor(self.next, builder.build())])
    }

    fn potential_violation_points(&self) -> ViolationPoints {
        ViolationPoints::new().with(self.rhs, self.selector)
    }
}

/// Continues at `then` if `variable` points to the node of `null`.
pub struct IfNull {
    pub variable: Name,
    pub null: Name,
    pub then: ProgramCounter,
    pub otherwise: ProgramCounter,
}

impl<C> Semantics<C> for IfNull {
    fn compute_successors(&self, state: &ProgramState, _ctx: &mut C) -> Result<Vec<ProgramState>, SemanticsError> {
        let heap = state.heap();
        let is_null = heap.variable_target(self.variable).is_some()
            && heap.variable_target(self.variable) == heap.variable_target(self.null);
        let pc = if is_null { self.then } else { self.otherwise };
        Ok(vec![state.successor(pc, heap.clone())])
    }

    fn potential_violation_points(&self) -> ViolationPoints {
        ViolationPoints::new()
    }
}
