use std::collections::VecDeque;

use hyperheap_graph::{HeapConfiguration, SymbolTable};
use hyperheap_statespace::{
    GenerationError, GeneratorConfig, ProgramState, StateSpace, StateSpaceGenerator,
};
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    CallId, Contract, ContractCollection, Dependency, MethodBody, MethodId, ProcedureContext,
    ProcedureError,
};

/// Computes contracts of possibly recursive methods.
///
/// Calls registered by [`InterproceduralAnalysis::add_call`] or by
/// [`Call`](crate::Call) statements are executed one after another; their
/// final states become postconditions of the callee. A state that waits for
/// a callee is resumed whenever that callee's contract gains
/// postconditions. Pending calls always run before waiting states are
/// resumed.
///
/// The loop ends once no call is pending and no contract changes. This only
/// happens if canonicalization leaves finitely many abstract heaps per
/// method, which is a property of the grammar.
pub struct InterproceduralAnalysis {
    config: GeneratorConfig,
    bodies: FxHashMap<MethodId, MethodBody>,
    spaces: FxHashMap<CallId, StateSpace>,
    aborted: FxHashSet<CallId>,
    continuations: VecDeque<Dependency>,
    ctx: ProcedureContext,
}

impl InterproceduralAnalysis {
    /// `config` is shared by all method generations, which always run nested.
    pub fn new(config: GeneratorConfig, symbols: SymbolTable) -> Self {
        Self {
            config: config.with_top_level(false),
            bodies: FxHashMap::default(),
            spaces: FxHashMap::default(),
            aborted: FxHashSet::default(),
            continuations: VecDeque::new(),
            ctx: ProcedureContext::new(symbols),
        }
    }

    // -- Setup -------------------------------------------------------------

    /// Declare a method so that statements can refer to it before its body
    /// exists.
    pub fn declare(&mut self, name: impl Into<String>) -> MethodId {
        self.ctx.declare_method(name)
    }

    pub fn define(&mut self, method: MethodId, body: MethodBody) -> Result<(), ProcedureError> {
        if !self.ctx.has_method(method) {
            return Err(ProcedureError::UnknownMethod(method));
        }
        self.bodies.insert(method, body);
        Ok(())
    }

    /// Register a call of `method` on `precondition` for the next
    /// [`InterproceduralAnalysis::run`].
    pub fn add_call(&mut self, method: MethodId, precondition: HeapConfiguration) -> CallId {
        self.ctx.register_call(method, precondition)
    }

    // -- Fixpoint ----------------------------------------------------------

    pub fn run(&mut self) -> Result<(), ProcedureError> {
        loop {
            let (call, changed) = if let Some(call) = self.ctx.next_pending_call() {
                (call, self.execute(call)?)
            } else if let Some(dependency) = self.continuations.pop_front() {
                (dependency.caller, self.resume(dependency)?)
            } else {
                break;
            };
            if changed {
                self.notify(call);
            }
        }
        info!(
            "interprocedural analysis done: {} calls, {} aborted",
            self.ctx.call_count(),
            self.aborted.len()
        );
        Ok(())
    }

    fn execute(&mut self, call: CallId) -> Result<bool, ProcedureError> {
        let method = self.ctx.call(call).method();
        let initial = ProgramState::new(self.ctx.call(call).precondition().clone(), 0);
        let body = self
            .bodies
            .get(&method)
            .ok_or(ProcedureError::UnknownMethod(method))?;
        info!("executing call {call:?} of `{}`", self.ctx.method(method).name());

        self.ctx.set_current_call(Some(call));
        let generated = StateSpaceGenerator::new(body, self.config.clone())
            .with_initial_state(initial)
            .generate(&mut self.ctx);
        self.ctx.set_current_call(None);
        self.record(call, generated)
    }

    /// Continue the state space of the waiting call at the waiting state.
    fn resume(&mut self, dependency: Dependency) -> Result<bool, ProcedureError> {
        let Dependency { caller, state } = dependency;
        if self.aborted.contains(&caller) {
            return Ok(false);
        }
        let Some(space) = self.spaces.remove(&caller) else {
            debug!("no state space for {caller:?}, nothing to resume");
            return Ok(false);
        };
        let method = self.ctx.call(caller).method();
        let body = self
            .bodies
            .get(&method)
            .ok_or(ProcedureError::UnknownMethod(method))?;
        debug!("resuming {caller:?} at {state:?}");

        self.ctx.set_current_call(Some(caller));
        let generated = StateSpaceGenerator::new(body, self.config.clone())
            .with_state_space(space, [state])
            .generate(&mut self.ctx);
        self.ctx.set_current_call(None);
        self.record(caller, generated)
    }

    /// Turn the final states of a generation into a contract of the callee.
    /// Returns whether new postconditions were found.
    fn record(
        &mut self,
        call: CallId,
        generated: Result<StateSpace, GenerationError>,
    ) -> Result<bool, ProcedureError> {
        let space = match generated {
            Ok(space) => space,
            Err(GenerationError::Aborted { reason }) => {
                warn!("call {call:?} aborted, no contract available: {reason}");
                self.aborted.insert(call);
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        };

        let postconditions: Vec<HeapConfiguration> = space
            .final_states()
            .filter_map(|id| space.state(id))
            .map(|state| state.heap().clone())
            .collect();
        let found = !postconditions.is_empty();
        let procedure = self.ctx.call(call);
        let method = procedure.method();
        let contract = Contract::new(procedure.precondition().clone(), postconditions);
        let changed = self.ctx.contracts_mut(method).add_contract(contract)?;
        self.spaces.insert(call, space);
        Ok(changed && found)
    }

    fn notify(&mut self, call: CallId) {
        for dependency in self.ctx.dependents(call) {
            if !self.continuations.contains(dependency) {
                self.continuations.push_back(*dependency);
            }
        }
    }

    // -- Results -----------------------------------------------------------

    pub fn contracts(&self, method: MethodId) -> &ContractCollection {
        self.ctx.contracts(method)
    }

    /// The state space of a call, unless the call aborted.
    pub fn state_space(&self, call: CallId) -> Option<&StateSpace> {
        self.spaces.get(&call)
    }

    pub fn is_aborted(&self, call: CallId) -> bool {
        self.aborted.contains(&call)
    }

    pub fn context(&self) -> &ProcedureContext {
        &self.ctx
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.ctx.symbols()
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        self.ctx.symbols_mut()
    }
}
