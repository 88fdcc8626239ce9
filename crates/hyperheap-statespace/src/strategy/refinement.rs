use log::debug;

use crate::ProgramState;
use crate::state::GARBAGE_COLLECTED;

/// Adjusts a successor state before it is abstracted and inserted.
pub trait StateRefinementStrategy {
    fn refine(&self, state: ProgramState) -> ProgramState;
}

/// Removes nodes that neither variables nor the interface can reach.
#[derive(Clone, Copy, Debug, Default)]
pub struct GarbageCollector;

impl StateRefinementStrategy for GarbageCollector {
    fn refine(&self, state: ProgramState) -> ProgramState {
        let mut builder = state.heap().clone().builder();
        let removed = builder.collect_garbage();
        if removed == 0 {
            return state;
        }
        debug!("collected {removed} unreachable nodes at pc {}", state.pc());
        let mut refined = state.with_heap(builder.build());
        for proposition in state.propositions() {
            refined.add_proposition(proposition);
        }
        refined.add_proposition(GARBAGE_COLLECTED);
        refined
    }
}
