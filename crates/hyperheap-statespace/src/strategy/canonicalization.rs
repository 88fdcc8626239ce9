use std::sync::Arc;

use hyperheap_graph::{Constants, FieldTable, HeapConfiguration, SymbolTable, ViolationPoints};
use hyperheap_rewrite::{AbstractionMode, HeapCanonicalization, HeapMaterialization, MaterializeResult};

use crate::ProgramState;

/// How successors of a statement are abstracted.
#[derive(Clone, Default)]
pub enum CanonicalizationPolicy {
    /// Keep successors concrete.
    #[default]
    None,
    /// One canonical heap per successor.
    Single(Arc<dyn HeapCanonicalization>),
    /// Canonicalize, then re-materialize every declared field of the nodes
    /// variables point to. Each materialization becomes its own state.
    Admissible {
        canonicalization: Arc<dyn HeapCanonicalization>,
        fields: FieldTable,
        constants: Constants,
    },
}

impl std::fmt::Debug for CanonicalizationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalizationPolicy::None => f.write_str("None"),
            CanonicalizationPolicy::Single(_) => f.write_str("Single"),
            CanonicalizationPolicy::Admissible { .. } => f.write_str("Admissible"),
        }
    }
}

impl CanonicalizationPolicy {
    pub fn single(canonicalization: impl HeapCanonicalization + 'static) -> Self {
        CanonicalizationPolicy::Single(Arc::new(canonicalization))
    }

    pub fn admissible(
        canonicalization: impl HeapCanonicalization + 'static,
        symbols: &SymbolTable,
    ) -> Self {
        CanonicalizationPolicy::Admissible {
            canonicalization: Arc::new(canonicalization),
            fields: symbols.field_table(),
            constants: symbols.constants(),
        }
    }

    /// Abstract `state` into one or more states at the same location.
    pub(crate) fn apply(
        &self,
        state: ProgramState,
        mode: AbstractionMode,
        materialization: &dyn HeapMaterialization,
    ) -> Vec<ProgramState> {
        match self {
            CanonicalizationPolicy::None => vec![state],
            CanonicalizationPolicy::Single(canonicalization) => {
                let heap = canonicalization.canonicalize(state.heap().clone(), mode);
                vec![relabeled(&state, heap)]
            }
            CanonicalizationPolicy::Admissible {
                canonicalization,
                fields,
                constants,
            } => {
                let heap = canonicalization.canonicalize(state.heap().clone(), mode);
                let points = field_obligations(&heap, fields, constants);
                match materialization.materialize(&heap, &points) {
                    MaterializeResult::Resolved(heaps) => heaps
                        .into_iter()
                        .map(|heap| relabeled(&state, heap))
                        .collect(),
                    MaterializeResult::Satisfied | MaterializeResult::NoRuleApplicable => {
                        vec![relabeled(&state, heap)]
                    }
                }
            }
        }
    }
}

/// `state` with `heap`, keeping its propositions.
fn relabeled(state: &ProgramState, heap: HeapConfiguration) -> ProgramState {
    let mut abstracted = state.with_heap(heap);
    for proposition in state.propositions() {
        abstracted.add_proposition(proposition);
    }
    abstracted
}

/// Every declared field of every node a program variable points to.
fn field_obligations(
    heap: &HeapConfiguration,
    fields: &FieldTable,
    constants: &Constants,
) -> ViolationPoints {
    let mut points = ViolationPoints::new();
    for variable in heap.variables() {
        let name = heap.name_of(variable);
        let ty = heap.node_type(heap.target_of(variable));
        if constants.is_constant_name(name) || constants.is_constant_type(ty) {
            continue;
        }
        for selector in fields.fields(ty) {
            points.add(name, *selector);
        }
    }
    points
}
