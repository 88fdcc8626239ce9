use std::collections::VecDeque;
use std::hash::BuildHasher;

use hyperheap_graph::arena::Arena;
use hyperheap_graph::{HeapConfiguration, SymbolTable};
use hyperheap_statespace::StateId;
use log::debug;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::contract::precondition_match;
use crate::{ContractCollection, Method, MethodId};

arena_id! {
    /// Identifies a registered [`ProcedureCall`].
    struct CallId
}

/// A method started on a precondition heap.
#[derive(Clone, Debug)]
pub struct ProcedureCall {
    method: MethodId,
    precondition: HeapConfiguration,
    hash: u64,
}

impl ProcedureCall {
    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn precondition(&self) -> &HeapConfiguration {
        &self.precondition
    }
}

/// A state of `caller`'s state space that waits for a callee contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub caller: CallId,
    pub state: StateId,
}

/// Context threaded through the generation of method state spaces.
///
/// Owns the symbol table, the declared methods with their contracts, and the
/// bookkeeping of calls that statements register while they run.
#[derive(Debug, Default)]
pub struct ProcedureContext {
    symbols: SymbolTable,
    methods: Arena<MethodId, Method>,
    calls: Arena<CallId, ProcedureCall>,
    pending: VecDeque<CallId>,
    dependencies: FxHashMap<CallId, Vec<Dependency>>,
    current: Option<CallId>,
}

impl ProcedureContext {
    pub fn new(symbols: SymbolTable) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }

    // -- Symbols -----------------------------------------------------------

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    // -- Methods -----------------------------------------------------------

    pub fn declare_method(&mut self, name: impl Into<String>) -> MethodId {
        self.methods.alloc(Method::new(name))
    }

    pub fn has_method(&self, id: MethodId) -> bool {
        self.methods.contains(id)
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id]
    }

    pub fn method_by_name(&self, name: &str) -> Option<MethodId> {
        self.methods
            .iter()
            .find(|(_, method)| method.name() == name)
            .map(|(id, _)| id)
    }

    pub fn contracts(&self, method: MethodId) -> &ContractCollection {
        self.methods[method].contracts()
    }

    pub fn contracts_mut(&mut self, method: MethodId) -> &mut ContractCollection {
        self.methods[method].contracts_mut()
    }

    // -- Calls -------------------------------------------------------------

    pub fn call(&self, id: CallId) -> &ProcedureCall {
        &self.calls[id]
    }

    /// The call whose state space is currently generated, if any.
    pub fn current_call(&self) -> Option<CallId> {
        self.current
    }

    pub(crate) fn set_current_call(&mut self, call: Option<CallId>) {
        self.current = call;
    }

    /// The registered call of `method` on a precondition equal to `heap` up
    /// to the order of external nodes.
    pub fn find_call(&self, method: MethodId, heap: &HeapConfiguration) -> Option<CallId> {
        let hash = FxBuildHasher.hash_one(heap);
        self.calls
            .iter()
            .find(|(_, call)| {
                call.method == method
                    && call.hash == hash
                    && precondition_match(&call.precondition, heap).is_some()
            })
            .map(|(id, _)| id)
    }

    /// Register a call of `method` on `precondition`. Only calls that were
    /// not registered before are queued for execution.
    pub fn register_call(&mut self, method: MethodId, precondition: HeapConfiguration) -> CallId {
        if let Some(existing) = self.find_call(method, &precondition) {
            return existing;
        }
        let hash = FxBuildHasher.hash_one(&precondition);
        let id = self.calls.alloc(ProcedureCall {
            method,
            precondition,
            hash,
        });
        debug!("registered call {id:?} of `{}`", self.methods[method].name());
        self.pending.push_back(id);
        id
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub(crate) fn next_pending_call(&mut self) -> Option<CallId> {
        self.pending.pop_front()
    }

    pub fn has_pending_calls(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Record that `state` of the current call waits for contracts of `callee`.
    pub fn add_dependency(&mut self, callee: CallId, state: StateId) {
        let Some(caller) = self.current else {
            debug!("dependency on {callee:?} outside of a call, ignored");
            return;
        };
        let dependency = Dependency { caller, state };
        let waiting = self.dependencies.entry(callee).or_default();
        if !waiting.contains(&dependency) {
            waiting.push(dependency);
        }
    }

    pub fn dependents(&self, callee: CallId) -> &[Dependency] {
        self.dependencies
            .get(&callee)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperheap_statespace::{ProgramState, StateSpace};

    fn single_node(symbols: &mut SymbolTable, external: bool) -> HeapConfiguration {
        let ty = symbols.ty("Node");
        let mut builder = HeapConfiguration::new().builder();
        let node = builder.add_node(ty);
        if external {
            builder.set_external(node);
        }
        builder.build()
    }

    #[test]
    fn test_calls_are_registered_once() {
        let mut ctx = ProcedureContext::new(SymbolTable::new());
        let method = ctx.declare_method("run");
        let heap = single_node(ctx.symbols_mut(), false);

        let first = ctx.register_call(method, heap.clone());
        let second = ctx.register_call(method, heap.clone());
        assert_eq!(first, second);
        assert_eq!(ctx.next_pending_call(), Some(first));
        assert_eq!(ctx.next_pending_call(), None);

        let other = single_node(ctx.symbols_mut(), true);
        assert_ne!(ctx.register_call(method, other), first);
        assert_eq!(ctx.method_by_name("run"), Some(method));
    }

    #[test]
    fn test_dependencies_need_a_current_call() {
        let mut ctx = ProcedureContext::new(SymbolTable::new());
        let method = ctx.declare_method("run");
        let heap = single_node(ctx.symbols_mut(), false);
        let callee = ctx.register_call(method, heap.clone());
        let state = StateSpace::new().add_state(ProgramState::new(heap, 0));

        ctx.add_dependency(callee, state);
        assert!(ctx.dependents(callee).is_empty());

        ctx.set_current_call(Some(callee));
        ctx.add_dependency(callee, state);
        ctx.add_dependency(callee, state);
        assert_eq!(ctx.dependents(callee).len(), 1);
        assert_eq!(ctx.dependents(callee)[0].caller, callee);
    }
}
