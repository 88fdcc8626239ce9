use std::collections::VecDeque;
use std::sync::Arc;

use hyperheap_rewrite::{AbstractionMode, HeapMaterialization};
use log::{debug, info, warn};

use crate::strategy::{
    AbortStrategy, CanonicalizationPolicy, EmptyStateSpace, ExhaustiveExploration,
    ExplorationOrder, ExplorationStrategy, FinalStateStrategy, NeverAbort, NoLabeling,
    NoPostProcessing, PostProcessingStrategy, StateLabelingStrategy, StateRefinementStrategy,
    StateSpaceSupplier, TerminalStatementFinalState,
};
use crate::{
    GenerationError, Program, ProgramState, Semantics, SemanticsError, StateId, StateSpace,
    TransitionKind,
};

/// Strategies shared by every generation of an analysis.
///
/// Cloning is cheap, all strategies are reference counted.
#[derive(Clone)]
pub struct GeneratorConfig {
    materialization: Arc<dyn HeapMaterialization>,
    canonicalization: CanonicalizationPolicy,
    abort: Arc<dyn AbortStrategy>,
    labeling: Arc<dyn StateLabelingStrategy>,
    exploration: Arc<dyn ExplorationStrategy>,
    post_processing: Arc<dyn PostProcessingStrategy>,
    final_states: Arc<dyn FinalStateStrategy>,
    supplier: Arc<dyn StateSpaceSupplier>,
    refinement: Option<Arc<dyn StateRefinementStrategy>>,
    order: ExplorationOrder,
    top_level: bool,
    aggressive_return_abstraction: bool,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("canonicalization", &self.canonicalization)
            .field("order", &self.order)
            .field("top_level", &self.top_level)
            .field("aggressive_return_abstraction", &self.aggressive_return_abstraction)
            .finish_non_exhaustive()
    }
}

impl GeneratorConfig {
    /// Depth-first, top-level exploration without abstraction, bounds or
    /// post-processing.
    pub fn new(materialization: impl HeapMaterialization + 'static) -> Self {
        Self {
            materialization: Arc::new(materialization),
            canonicalization: CanonicalizationPolicy::None,
            abort: Arc::new(NeverAbort),
            labeling: Arc::new(NoLabeling),
            exploration: Arc::new(ExhaustiveExploration),
            post_processing: Arc::new(NoPostProcessing),
            final_states: Arc::new(TerminalStatementFinalState),
            supplier: Arc::new(EmptyStateSpace),
            refinement: None,
            order: ExplorationOrder::DepthFirst,
            top_level: true,
            aggressive_return_abstraction: false,
        }
    }

    // -- Builder methods ---------------------------------------------------

    pub fn with_canonicalization(mut self, policy: CanonicalizationPolicy) -> Self {
        self.canonicalization = policy;
        self
    }

    pub fn with_abort_strategy(mut self, strategy: impl AbortStrategy + 'static) -> Self {
        self.abort = Arc::new(strategy);
        self
    }

    pub fn with_labeling(mut self, strategy: impl StateLabelingStrategy + 'static) -> Self {
        self.labeling = Arc::new(strategy);
        self
    }

    pub fn with_exploration(mut self, strategy: impl ExplorationStrategy + 'static) -> Self {
        self.exploration = Arc::new(strategy);
        self
    }

    pub fn with_post_processing(mut self, strategy: impl PostProcessingStrategy + 'static) -> Self {
        self.post_processing = Arc::new(strategy);
        self
    }

    pub fn with_final_states(mut self, strategy: impl FinalStateStrategy + 'static) -> Self {
        self.final_states = Arc::new(strategy);
        self
    }

    pub fn with_state_space_supplier(mut self, supplier: impl StateSpaceSupplier + 'static) -> Self {
        self.supplier = Arc::new(supplier);
        self
    }

    pub fn with_refinement(mut self, strategy: impl StateRefinementStrategy + 'static) -> Self {
        self.refinement = Some(Arc::new(strategy));
        self
    }

    pub fn with_order(mut self, order: ExplorationOrder) -> Self {
        self.order = order;
        self
    }

    /// A top-level generation marks the state it stopped at as aborted and
    /// returns the partial state space. Nested generations return
    /// [`GenerationError::Aborted`] instead.
    pub fn with_top_level(mut self, top_level: bool) -> Self {
        self.top_level = top_level;
        self
    }

    /// Abstract successors of return statements without admissibility.
    pub fn with_aggressive_return_abstraction(mut self, enabled: bool) -> Self {
        self.aggressive_return_abstraction = enabled;
        self
    }

    // -- Accessors ---------------------------------------------------------

    pub fn materialization(&self) -> &dyn HeapMaterialization {
        self.materialization.as_ref()
    }

    pub fn is_top_level(&self) -> bool {
        self.top_level
    }
}

/// Explores the states of a program until no unexplored state is left.
pub struct StateSpaceGenerator<'p, C = ()> {
    program: &'p dyn Program<C>,
    config: GeneratorConfig,
    initial: Vec<ProgramState>,
    resume: Option<(StateSpace, Vec<StateId>)>,
}

impl<'p, C> StateSpaceGenerator<'p, C> {
    pub fn new(program: &'p dyn Program<C>, config: GeneratorConfig) -> Self {
        Self {
            program,
            config,
            initial: Vec::new(),
            resume: None,
        }
    }

    pub fn with_initial_state(mut self, state: ProgramState) -> Self {
        self.initial.push(state);
        self
    }

    pub fn with_initial_states(mut self, states: impl IntoIterator<Item = ProgramState>) -> Self {
        self.initial.extend(states);
        self
    }

    /// Continue a previous generation, re-exploring the states `resume_from`.
    pub fn with_state_space(
        mut self,
        space: StateSpace,
        resume_from: impl IntoIterator<Item = StateId>,
    ) -> Self {
        self.resume = Some((space, resume_from.into_iter().collect()));
        self
    }

    pub fn generate(self, ctx: &mut C) -> Result<StateSpace, GenerationError> {
        let Self {
            program,
            config,
            initial,
            resume,
        } = self;
        let (mut space, mut frontier) = match resume {
            Some((space, ids)) => (space, VecDeque::from(ids)),
            None => (config.supplier.supply(), VecDeque::new()),
        };
        for mut state in initial {
            config.labeling.label(&mut state);
            let insertion = space.add_initial_state(state);
            if insertion.is_new() {
                frontier.push_back(insertion.id());
            }
        }

        let mut explorer = Explorer {
            program,
            config: &config,
            space,
            frontier,
        };
        while let Some(id) = explorer.pop() {
            let outcome = explorer
                .explore(id, ctx)
                .and_then(|()| config.abort.check(&explorer.space));
            match outcome {
                Ok(()) => {}
                Err(GenerationError::Aborted { reason }) if config.top_level => {
                    warn!("state space generation stopped: {reason}");
                    explorer.space.set_aborted(id);
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        let mut space = explorer.space;
        config.post_processing.process(&mut space);
        info!(
            "generated {} states, {} final",
            space.len(),
            space.final_state_count()
        );
        Ok(space)
    }
}

struct Explorer<'a, 'p, C> {
    program: &'p dyn Program<C>,
    config: &'a GeneratorConfig,
    space: StateSpace,
    frontier: VecDeque<StateId>,
}

impl<C> Explorer<'_, '_, C> {
    fn pop(&mut self) -> Option<StateId> {
        match self.config.order {
            ExplorationOrder::DepthFirst => self.frontier.pop_back(),
            ExplorationOrder::BreadthFirst => self.frontier.pop_front(),
        }
    }

    fn enqueue(&mut self, id: StateId) {
        if let Some(state) = self.space.state(id)
            && self.config.exploration.check(state, &self.space)
        {
            self.frontier.push_back(id);
        }
    }

    fn explore(&mut self, id: StateId, ctx: &mut C) -> Result<(), GenerationError> {
        let Some(state) = self.space.state(id).cloned() else {
            return Ok(());
        };
        let statement = self
            .program
            .statement(state.pc())
            .ok_or(GenerationError::MissingStatement(state.pc()))?;

        if statement.needs_materialization(&state) && self.materialize(id, &state, statement) {
            return Ok(());
        }

        let successors = match statement.compute_successors(&state, ctx) {
            Ok(successors) => successors,
            Err(SemanticsError::NotSufficientlyMaterialized { pc }) => {
                debug!("state {id:?} at pc {pc} lacks materialization, no successors");
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };
        if self
            .config
            .final_states
            .is_final(&state, &successors, statement.is_terminal())
        {
            self.space.set_final(id);
        }

        let mode = if self.config.aggressive_return_abstraction && statement.is_return() {
            AbstractionMode::Aggressive
        } else {
            AbstractionMode::Admissible
        };
        for successor in successors {
            let successor = match &self.config.refinement {
                Some(refinement) => refinement.refine(successor),
                None => successor,
            };
            if statement.permits_canonicalization() {
                let abstracted = self.config.canonicalization.apply(
                    successor,
                    mode,
                    self.config.materialization.as_ref(),
                );
                for mut state in abstracted {
                    self.config.labeling.label(&mut state);
                    let insertion = self.space.add_state_if_absent(state);
                    self.space
                        .add_transition(id, insertion.id(), TransitionKind::ControlFlow);
                    if insertion.is_new() {
                        self.enqueue(insertion.id());
                    }
                }
            } else {
                let mut state = successor;
                self.config.labeling.label(&mut state);
                let successor = self.space.add_state(state);
                self.space
                    .add_transition(id, successor, TransitionKind::ControlFlow);
                self.enqueue(successor);
            }
        }
        Ok(())
    }

    /// Queue the materializations of `state`. Returns false if there are none.
    fn materialize(&mut self, id: StateId, state: &ProgramState, statement: &dyn Semantics<C>) -> bool {
        let points = statement.potential_violation_points();
        let heaps = self
            .config
            .materialization
            .materialize(state.heap(), &points)
            .into_heaps();
        if heaps.is_empty() {
            return false;
        }
        debug!("state {id:?} materialized into {} states", heaps.len());
        for heap in heaps {
            let mut materialized = state.with_heap(heap);
            self.config.labeling.label(&mut materialized);
            let successor = self.space.add_state(materialized);
            self.space
                .add_transition(id, successor, TransitionKind::Materialization);
            self.enqueue(successor);
        }
        true
    }
}
