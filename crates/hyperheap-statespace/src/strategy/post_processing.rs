use std::sync::Arc;

use hyperheap_rewrite::{AbstractionMode, HeapCanonicalization};
use log::debug;
use rustc_hash::FxHashMap;

use crate::{ProgramState, StateId, StateSpace};

/// Runs once a generation has explored every state.
pub trait PostProcessingStrategy {
    fn process(&self, space: &mut StateSpace);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoPostProcessing;

impl PostProcessingStrategy for NoPostProcessing {
    fn process(&self, _space: &mut StateSpace) {}
}

/// Abstracts final states aggressively and merges those that become equal.
///
/// The state space is left untouched unless this reduces the number of
/// final states.
#[derive(Clone)]
pub struct FinalStateCoalescing {
    canonicalization: Arc<dyn HeapCanonicalization>,
}

impl std::fmt::Debug for FinalStateCoalescing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalStateCoalescing").finish_non_exhaustive()
    }
}

impl FinalStateCoalescing {
    pub fn new(canonicalization: Arc<dyn HeapCanonicalization>) -> Self {
        Self { canonicalization }
    }
}

impl PostProcessingStrategy for FinalStateCoalescing {
    fn process(&self, space: &mut StateSpace) {
        let finals: Vec<StateId> = space.final_states().collect();
        if finals.len() < 2 {
            return;
        }

        let mut groups: Vec<(ProgramState, Vec<StateId>)> = Vec::new();
        for id in &finals {
            let Some(state) = space.state(*id) else {
                continue;
            };
            let heap = self
                .canonicalization
                .canonicalize(state.heap().clone(), AbstractionMode::Aggressive);
            let abstracted = state.with_heap(heap);
            match groups.iter_mut().find(|(representative, _)| *representative == abstracted) {
                Some((_, members)) => members.push(*id),
                None => groups.push((abstracted, vec![*id])),
            }
        }
        if groups.len() >= finals.len() {
            return;
        }

        debug!("coalescing {} final states into {}", finals.len(), groups.len());
        let mut replacements = FxHashMap::default();
        for (representative, members) in groups {
            let target = space.add_state_if_absent(representative).id();
            for member in members {
                replacements.insert(member, target);
            }
        }
        space.update_final_states(&replacements);
    }
}
