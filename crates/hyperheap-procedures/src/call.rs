use hyperheap_graph::{Name, Node, ViolationPoints};
use hyperheap_statespace::{ProgramCounter, ProgramState, Semantics, SemanticsError};
use log::debug;
use smallvec::SmallVec;

use crate::{ContractLookup, MethodId, ProcedureContext, extract_scope};

/// Invocation of a method of the surrounding analysis.
///
/// Arguments are attached as parameter variables, the reachable part of the
/// heap is cut out and matched against the callee's contracts. Each matching
/// postcondition yields a successor at `next`. Without a matching contract
/// the call is registered and the state waits until the analysis resumes it.
#[derive(Clone, Debug)]
pub struct Call {
    method: MethodId,
    arguments: SmallVec<[(Name, Name); 2]>,
    next: ProgramCounter,
}

impl Call {
    pub fn new(method: MethodId, next: ProgramCounter) -> Self {
        Self {
            method,
            arguments: SmallVec::new(),
            next,
        }
    }

    /// Bind `parameter` of the callee to the node of `argument`.
    pub fn with_argument(mut self, parameter: Name, argument: Name) -> Self {
        self.arguments.push((parameter, argument));
        self
    }

    pub fn method(&self) -> MethodId {
        self.method
    }
}

impl Semantics<ProcedureContext> for Call {
    fn compute_successors(
        &self,
        state: &ProgramState,
        ctx: &mut ProcedureContext,
    ) -> Result<Vec<ProgramState>, SemanticsError> {
        let heap = state.heap();
        let bound: SmallVec<[(Name, Node); 2]> = self
            .arguments
            .iter()
            .filter_map(|(parameter, argument)| {
                let target = heap.variable_target(*argument);
                if target.is_none() {
                    debug!("argument {argument:?} is undefined and not attached");
                }
                target.map(|node| (*parameter, node))
            })
            .collect();

        // parameters of the caller would otherwise be taken for the callee's
        let mut builder = heap.clone().builder();
        for variable in heap.variables() {
            let name = heap.name_of(variable);
            if ctx.symbols().is_parameter(name) {
                builder.remove_variable(variable);
            }
        }
        for (parameter, node) in &bound {
            builder.add_variable(*parameter, *node);
        }
        let prepared = builder.build();

        let name = ctx.method(self.method).name().to_string();
        let scoped =
            extract_scope(&prepared, &name, ctx.symbols_mut()).map_err(SemanticsError::custom)?;
        let merged = match ctx.contracts(self.method).match_contract(scoped.in_scope()) {
            ContractLookup::Match {
                postconditions,
                permutation,
            } => Some(
                postconditions
                    .iter()
                    .map(|postcondition| scoped.merge_postcondition(postcondition, &permutation))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ContractLookup::NoMatch => None,
        };

        let Some(heaps) = merged else {
            debug!("no contract of `{name}` matches, registering call");
            let callee = ctx.register_call(self.method, scoped.into_in_scope());
            if let Some(id) = state.id() {
                ctx.add_dependency(callee, id);
            }
            return Ok(Vec::new());
        };

        // later contracts of the callee have to reach this state as well
        if let Some(callee) = ctx.find_call(self.method, scoped.in_scope())
            && let Some(id) = state.id()
        {
            ctx.add_dependency(callee, id);
        }
        debug!("contract of `{name}` yields {} postconditions", heaps.len());
        Ok(heaps
            .into_iter()
            .map(|heap| {
                let mut builder = heap.builder();
                for (parameter, _) in &bound {
                    builder.remove_variable_named(*parameter);
                }
                state.successor(self.next, builder.build())
            })
            .collect())
    }

    fn potential_violation_points(&self) -> ViolationPoints {
        ViolationPoints::new()
    }
}
