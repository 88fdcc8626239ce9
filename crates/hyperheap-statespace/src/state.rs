use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use hyperheap_graph::HeapConfiguration;
use hyperheap_graph::arena::{Id, Identifier};

/// Position of a statement in a [`Program`](crate::Program).
pub type ProgramCounter = usize;

/// Atomic proposition of final states.
pub const TERMINATED: &str = "{ terminated }";
/// Atomic proposition of states at which a top-level generation stopped.
pub const ABORTED: &str = "{ aborted }";
/// Atomic proposition of states from which unreachable nodes were removed.
pub const GARBAGE_COLLECTED: &str = "{ garbage collected }";

/// Identifies a state within one [`StateSpace`](crate::StateSpace).
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateId(Id);

impl StateId {
    /// return raw ID as usize
    pub fn raw(self) -> usize {
        self.0.raw()
    }
}

impl From<Id> for StateId {
    fn from(value: Id) -> Self {
        Self(value)
    }
}

impl From<StateId> for Id {
    fn from(value: StateId) -> Self {
        value.0
    }
}

impl Identifier for StateId {}

/// A heap at a program location.
///
/// Equality and hashing only consider the heap, the program counter and the
/// scope depth. Atomic propositions and the state space id are annotations.
#[derive(Clone, Debug)]
pub struct ProgramState {
    heap: HeapConfiguration,
    pc: ProgramCounter,
    scope_depth: usize,
    propositions: BTreeSet<String>,
    id: Option<StateId>,
}

impl ProgramState {
    pub fn new(heap: HeapConfiguration, pc: ProgramCounter) -> Self {
        Self {
            heap,
            pc,
            scope_depth: 0,
            propositions: BTreeSet::new(),
            id: None,
        }
    }

    pub fn with_scope_depth(mut self, scope_depth: usize) -> Self {
        self.scope_depth = scope_depth;
        self
    }

    /// Same location with another heap. Annotations are not copied.
    pub fn with_heap(&self, heap: HeapConfiguration) -> Self {
        Self::new(heap, self.pc).with_scope_depth(self.scope_depth)
    }

    /// A state at `pc` in the same scope.
    pub fn successor(&self, pc: ProgramCounter, heap: HeapConfiguration) -> Self {
        Self::new(heap, pc).with_scope_depth(self.scope_depth)
    }

    // -- Accessors ---------------------------------------------------------

    pub fn heap(&self) -> &HeapConfiguration {
        &self.heap
    }

    pub fn into_heap(self) -> HeapConfiguration {
        self.heap
    }

    pub fn pc(&self) -> ProgramCounter {
        self.pc
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_depth
    }

    /// Number of heap nodes.
    pub fn size(&self) -> usize {
        self.heap.node_count()
    }

    /// Set once the state is inserted into a state space.
    pub fn id(&self) -> Option<StateId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: StateId) {
        self.id = Some(id);
    }

    // -- Atomic propositions -----------------------------------------------

    pub fn propositions(&self) -> impl Iterator<Item = &str> {
        self.propositions.iter().map(String::as_str)
    }

    pub fn has_proposition(&self, proposition: &str) -> bool {
        self.propositions.contains(proposition)
    }

    pub fn add_proposition(&mut self, proposition: impl Into<String>) {
        self.propositions.insert(proposition.into());
    }
}

impl PartialEq for ProgramState {
    fn eq(&self, other: &Self) -> bool {
        self.pc == other.pc && self.scope_depth == other.scope_depth && self.heap == other.heap
    }
}

impl Eq for ProgramState {}

impl Hash for ProgramState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.heap.hash(state);
        self.pc.hash(state);
        self.scope_depth.hash(state);
    }
}
