use crate::{GenerationError, StateSpace};

/// Stops generation when a state space grows too large.
pub trait AbortStrategy {
    fn check(&self, space: &StateSpace) -> Result<(), GenerationError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NeverAbort;

impl AbortStrategy for NeverAbort {
    fn check(&self, _space: &StateSpace) -> Result<(), GenerationError> {
        Ok(())
    }
}

/// Caps the number of states and the node count of a single heap.
#[derive(Clone, Copy, Debug)]
pub struct StateSpaceBoundedAbortStrategy {
    max_states: usize,
    max_state_size: usize,
}

impl StateSpaceBoundedAbortStrategy {
    pub fn new(max_states: usize, max_state_size: usize) -> Self {
        Self {
            max_states,
            max_state_size,
        }
    }
}

impl AbortStrategy for StateSpaceBoundedAbortStrategy {
    fn check(&self, space: &StateSpace) -> Result<(), GenerationError> {
        if space.len() > self.max_states {
            return Err(GenerationError::Aborted {
                reason: format!("state space exceeds {} states", self.max_states),
            });
        }
        if space.maximal_state_size() > self.max_state_size {
            return Err(GenerationError::Aborted {
                reason: format!("a heap exceeds {} nodes", self.max_state_size),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgramState;
    use hyperheap_graph::{HeapConfiguration, SymbolTable};

    #[test]
    fn test_bounds() {
        let mut symbols = SymbolTable::new();
        let ty = symbols.ty("Node");
        let mut builder = HeapConfiguration::new().builder();
        builder.add_nodes(ty, 3);
        let mut space = StateSpace::new();
        space.add_state(ProgramState::new(builder.build(), 0));

        assert!(StateSpaceBoundedAbortStrategy::new(1, 3).check(&space).is_ok());
        assert!(matches!(
            StateSpaceBoundedAbortStrategy::new(0, 3).check(&space),
            Err(GenerationError::Aborted { .. })
        ));
        assert!(StateSpaceBoundedAbortStrategy::new(1, 2).check(&space).is_err());
    }
}
