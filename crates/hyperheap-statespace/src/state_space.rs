use std::collections::BTreeSet;
use std::hash::BuildHasher;

use hyperheap_graph::arena::Arena;
use log::debug;
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::state::{ABORTED, TERMINATED};
use crate::{ProgramState, StateId};

/// Why one state follows another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// The target concretizes the source at the same statement.
    Materialization,
    /// The target results from executing the source's statement.
    ControlFlow,
    /// Self-loop of a final state, so that every trace is infinite.
    Artificial,
}

/// Result of [`StateSpace::add_state_if_absent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    New(StateId),
    /// An equal state was already present under this id.
    Existing(StateId),
}

impl Insertion {
    pub fn id(self) -> StateId {
        match self {
            Insertion::New(id) | Insertion::Existing(id) => id,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Insertion::New(_))
    }
}

/// All states discovered by a generation and the transitions between them.
///
/// States are split into a mergeable pool, where equal states are stored
/// once, and an exempt pool that is never merged.
#[derive(Clone, Debug, Default)]
pub struct StateSpace {
    states: Arena<StateId, ProgramState>,
    buckets: FxHashMap<u64, SmallVec<[StateId; 2]>>,
    exempt: FxHashSet<StateId>,
    transitions: DiGraphMap<StateId, TransitionKind>,
    initial: BTreeSet<StateId>,
    finals: BTreeSet<StateId>,
    maximal_state_size: usize,
}

impl StateSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transitions: DiGraphMap::with_capacity(capacity, capacity),
            ..Self::default()
        }
    }

    // -- Insertion ---------------------------------------------------------

    /// Insert `state` into the exempt pool.
    pub fn add_state(&mut self, state: ProgramState) -> StateId {
        let id = self.insert(state);
        self.exempt.insert(id);
        id
    }

    /// Insert `state` into the mergeable pool unless an equal state exists.
    pub fn add_state_if_absent(&mut self, state: ProgramState) -> Insertion {
        let hash = FxBuildHasher.hash_one(&state);
        if let Some(bucket) = self.buckets.get(&hash)
            && let Some(existing) = bucket.iter().find(|id| self.states[**id] == state)
        {
            debug!("state at pc {} merged into {existing:?}", state.pc());
            return Insertion::Existing(*existing);
        }
        let id = self.insert(state);
        self.buckets.entry(hash).or_default().push(id);
        Insertion::New(id)
    }

    pub fn add_initial_state(&mut self, state: ProgramState) -> Insertion {
        let insertion = self.add_state_if_absent(state);
        self.initial.insert(insertion.id());
        insertion
    }

    fn insert(&mut self, mut state: ProgramState) -> StateId {
        let id = self.states.next_id();
        state.set_id(id);
        self.maximal_state_size = self.maximal_state_size.max(state.size());
        self.states.alloc(state);
        self.transitions.add_node(id);
        id
    }

    pub fn add_transition(&mut self, from: StateId, to: StateId, kind: TransitionKind) {
        self.transitions.add_edge(from, to, kind);
    }

    // -- Final and aborted states ------------------------------------------

    /// Mark `id` final and give it an artificial self-loop.
    pub fn set_final(&mut self, id: StateId) {
        self.states[id].add_proposition(TERMINATED);
        self.finals.insert(id);
        self.add_transition(id, id, TransitionKind::Artificial);
    }

    pub fn set_aborted(&mut self, id: StateId) {
        self.states[id].add_proposition(ABORTED);
    }

    /// Replace every final state `old` in `replacements` by the final state
    /// it maps to. Transitions into `old` are redirected and `old` is removed.
    pub fn update_final_states(&mut self, replacements: &FxHashMap<StateId, StateId>) {
        for (&old, &new) in replacements {
            if old == new || !self.finals.contains(&old) {
                continue;
            }
            let inbound: Vec<(StateId, TransitionKind)> = self
                .transitions
                .edges_directed(old, Direction::Incoming)
                .filter(|(from, _, _)| *from != old)
                .map(|(from, _, kind)| (from, *kind))
                .collect();
            for (from, kind) in inbound {
                self.add_transition(from, new, kind);
            }
            self.remove_state(old);
            if !self.finals.contains(&new) {
                self.set_final(new);
            }
        }
    }

    fn remove_state(&mut self, id: StateId) {
        let state = &self.states[id];
        let hash = FxBuildHasher.hash_one(state);
        if let Some(bucket) = self.buckets.get_mut(&hash) {
            bucket.retain(|candidate| *candidate != id);
        }
        self.exempt.remove(&id);
        self.initial.remove(&id);
        self.finals.remove(&id);
        self.transitions.remove_node(id);
        self.states.delete(id);
    }

    // -- Accessors ---------------------------------------------------------

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateId) -> Option<&ProgramState> {
        self.states.get(id)
    }

    pub fn states(&self) -> impl Iterator<Item = &ProgramState> {
        self.states.iter().map(|(_, state)| state)
    }

    pub fn initial_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.initial.iter().copied()
    }

    pub fn final_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.finals.iter().copied()
    }

    pub fn final_state_count(&self) -> usize {
        self.finals.len()
    }

    pub fn is_final(&self, id: StateId) -> bool {
        self.finals.contains(&id)
    }

    /// Whether `id` was stored without merging.
    pub fn is_exempt(&self, id: StateId) -> bool {
        self.exempt.contains(&id)
    }

    pub fn successors(&self, id: StateId, kind: TransitionKind) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .edges_directed(id, Direction::Outgoing)
            .filter(move |(_, _, k)| **k == kind)
            .map(|(_, to, _)| to)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.edge_count()
    }

    pub fn satisfies_ap(&self, id: StateId, proposition: &str) -> bool {
        self.state(id)
            .is_some_and(|state| state.has_proposition(proposition))
    }

    /// Largest node count of any state ever inserted.
    pub fn maximal_state_size(&self) -> usize {
        self.maximal_state_size
    }

    pub fn contains_aborted_states(&self) -> bool {
        self.states().any(|state| state.has_proposition(ABORTED))
    }
}
