mod common;

use std::sync::{Arc, Mutex};

use common::*;
use hyperheap_graph::*;
use hyperheap_statespace::strategy::{
    FinalStateCoalescing, GarbageCollector, StateSpaceBoundedAbortStrategy,
};
use hyperheap_statespace::*;
use hyperheap_test_utils::ListFixture;
use hyperheap_test_utils::toy::{Branch, FieldAccess, IfNull, Return, Skip, Terminal};
use test_log::test;

// ---------------------------------------------------------------------------
// Straight-line programs
// ---------------------------------------------------------------------------

#[test]
fn test_straight_line_program() {
    let fixture = ListFixture::new();
    let program: Statements = vec![
        Box::new(Skip { next: 1 }),
        Box::new(Return::new(2, [])),
        Box::new(Terminal),
    ];

    let space = StateSpaceGenerator::new(&program, list_config(&fixture))
        .with_initial_state(ProgramState::new(single_node(&fixture), 0))
        .generate(&mut ())
        .unwrap();

    assert_eq!(space.len(), 3);
    assert_eq!(space.final_state_count(), 1);
    let last = space.final_states().next().unwrap();
    assert!(space.satisfies_ap(last, TERMINATED));
    assert_eq!(space.state(last).map(ProgramState::pc), Some(2));
    assert_eq!(space.successors(last, TransitionKind::Artificial).collect::<Vec<_>>(), vec![last]);
    assert_eq!(space.initial_states().count(), 1);
}

#[test]
fn test_equal_successors_are_merged() {
    let fixture = ListFixture::new();
    let program: Statements = vec![
        Box::new(Branch { targets: vec![1, 2] }),
        Box::new(Skip { next: 3 }),
        Box::new(Skip { next: 3 }),
        Box::new(Terminal),
    ];

    let space = StateSpaceGenerator::new(&program, list_config(&fixture))
        .with_initial_state(ProgramState::new(single_node(&fixture), 0))
        .generate(&mut ())
        .unwrap();

    assert_eq!(space.len(), 4);
    assert_eq!(states_at(&space, 3).len(), 1);
    assert_eq!(space.final_state_count(), 1);
}

#[test]
fn test_missing_statement() {
    let fixture = ListFixture::new();
    let program: Statements = vec![Box::new(Skip { next: 5 })];

    let err = StateSpaceGenerator::new(&program, list_config(&fixture))
        .with_initial_state(ProgramState::new(single_node(&fixture), 0))
        .generate(&mut ())
        .unwrap_err();
    assert!(matches!(err, GenerationError::MissingStatement(5)));
}

// ---------------------------------------------------------------------------
// Exploration order
// ---------------------------------------------------------------------------

fn labeling_order(order: ExplorationOrder) -> Vec<ProgramCounter> {
    let fixture = ListFixture::new();
    let program: Statements = vec![
        Box::new(Branch { targets: vec![1, 2] }),
        Box::new(Skip { next: 3 }),
        Box::new(Skip { next: 4 }),
        Box::new(Terminal),
        Box::new(Terminal),
    ];
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let config = list_config(&fixture)
        .with_order(order)
        .with_labeling(move |state: &mut ProgramState| recorder.lock().unwrap().push(state.pc()));

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(single_node(&fixture), 0))
        .generate(&mut ())
        .unwrap();
    assert_eq!(space.final_state_count(), 2);
    seen.lock().unwrap().clone()
}

#[test]
fn test_depth_first_explores_latest_state_first() {
    assert_eq!(labeling_order(ExplorationOrder::DepthFirst), vec![0, 1, 2, 4, 3]);
}

#[test]
fn test_breadth_first_explores_oldest_state_first() {
    assert_eq!(labeling_order(ExplorationOrder::BreadthFirst), vec![0, 1, 2, 3, 4]);
}

// ---------------------------------------------------------------------------
// Materialization and abstraction
// ---------------------------------------------------------------------------

/// `while (x != null) x = x.next;`
fn traversal(fixture: &mut ListFixture) -> Statements {
    let x = fixture.variable("x");
    let null = fixture.symbols.null_name();
    vec![
        Box::new(IfNull {
            variable: x,
            null,
            then: 2,
            otherwise: 1,
        }),
        Box::new(FieldAccess {
            lhs: x,
            rhs: x,
            selector: fixture.next,
            next: 0,
        }),
        Box::new(Terminal),
    ]
}

#[test]
fn test_list_traversal_terminates() {
    let mut fixture = ListFixture::new();
    let program = traversal(&mut fixture);
    let config = list_config(&fixture)
        .with_canonicalization(CanonicalizationPolicy::single(list_canonicalization(&fixture)))
        .with_refinement(GarbageCollector);

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(fixture.abstract_list("x"), 0))
        .generate(&mut ())
        .unwrap();

    // initial, before the access, two materializations, x at null, exit
    assert_eq!(space.len(), 6);
    assert_eq!(space.final_state_count(), 1);

    let x = fixture.variable("x");
    let null = fixture.symbols.null_name();
    let last = space.final_states().next().unwrap();
    let heap = space.state(last).unwrap().heap();
    assert_eq!(heap.variable_target(x), heap.variable_target(null));

    let initial = space.initial_states().next().unwrap();
    let at_access: Vec<StateId> = space.successors(initial, TransitionKind::ControlFlow).collect();
    assert_eq!(at_access.len(), 1);
    assert_eq!(
        space.successors(at_access[0], TransitionKind::Materialization).count(),
        2
    );
    assert!(space.states().any(|state| state.has_proposition(GARBAGE_COLLECTED)));
}

#[test]
fn test_admissible_policy_materializes_fields_of_variables() {
    let mut fixture = ListFixture::new();
    let program = traversal(&mut fixture);
    let policy = CanonicalizationPolicy::admissible(list_canonicalization(&fixture), &fixture.symbols);
    let config = list_config(&fixture)
        .with_canonicalization(policy)
        .with_refinement(GarbageCollector);

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(fixture.abstract_list("x"), 0))
        .generate(&mut ())
        .unwrap();

    assert_eq!(space.final_state_count(), 1);
    let x = fixture.variable("x");
    for state in states_at(&space, 1) {
        let heap = state.heap();
        let node = heap.variable_target(x).unwrap();
        assert!(heap.selector_target(node, fixture.next).is_some());
    }
    assert!(space.states().all(|state| state.size() <= 4));
}

#[test]
fn test_unresolvable_access_has_no_successors() {
    let mut fixture = ListFixture::new();
    let x = fixture.variable("x");
    let program: Statements = vec![
        Box::new(FieldAccess {
            lhs: x,
            rhs: x,
            selector: fixture.next,
            next: 1,
        }),
        Box::new(Terminal),
    ];
    let heap = {
        let mut builder = HeapConfiguration::new().builder();
        let node = builder.add_node(fixture.node);
        builder.add_variable(x, node);
        builder.build()
    };

    let space = StateSpaceGenerator::new(&program, list_config(&fixture))
        .with_initial_state(ProgramState::new(heap, 0))
        .generate(&mut ())
        .unwrap();
    assert_eq!(space.len(), 1);
    assert_eq!(space.final_state_count(), 0);
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn long_program() -> Statements {
    let mut program: Statements = (1..6).map(|next| Box::new(Skip { next }) as Box<dyn Semantics>).collect();
    program.push(Box::new(Terminal));
    program
}

#[test]
fn test_top_level_abort_keeps_partial_state_space() {
    let fixture = ListFixture::new();
    let program = long_program();
    let config = list_config(&fixture).with_abort_strategy(StateSpaceBoundedAbortStrategy::new(2, 100));

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(single_node(&fixture), 0))
        .generate(&mut ())
        .unwrap();
    assert_eq!(space.len(), 3);
    assert!(space.contains_aborted_states());
    assert_eq!(space.final_state_count(), 0);
}

#[test]
fn test_nested_abort_is_an_error() {
    let fixture = ListFixture::new();
    let program = long_program();
    let config = list_config(&fixture)
        .with_abort_strategy(StateSpaceBoundedAbortStrategy::new(2, 100))
        .with_top_level(false);

    let err = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(single_node(&fixture), 0))
        .generate(&mut ())
        .unwrap_err();
    assert!(matches!(err, GenerationError::Aborted { .. }));
}

#[test]
fn test_garbage_collection_of_successors() {
    let mut fixture = ListFixture::new();
    let x = fixture.variable("x");
    let program: Statements = vec![Box::new(Skip { next: 1 }), Box::new(Terminal)];
    let heap = {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(fixture.node, 2);
        builder.add_variable(x, nodes[0]);
        builder.build()
    };
    let config = list_config(&fixture).with_refinement(GarbageCollector);

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(heap, 0))
        .generate(&mut ())
        .unwrap();
    let collected = states_at(&space, 1);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].size(), 1);
    assert!(collected[0].has_proposition(GARBAGE_COLLECTED));
}

#[test]
fn test_final_states_are_coalesced() {
    let mut fixture = ListFixture::new();
    let x = fixture.variable("x");
    let concrete = {
        let (heap, nodes) = fixture.chain(2);
        let mut builder = heap.builder();
        builder.add_variable(x, nodes[0]);
        builder.build()
    };
    let abstracted = {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(fixture.node, 2);
        builder.add_edge(fixture.list, &nodes).unwrap();
        builder.add_variable(x, nodes[0]);
        builder.build()
    };
    let program: Statements = vec![Box::new(Terminal)];
    let coalescing = FinalStateCoalescing::new(Arc::new(list_canonicalization(&fixture)));
    let config = list_config(&fixture).with_post_processing(coalescing);

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_states([ProgramState::new(concrete, 0), ProgramState::new(abstracted.clone(), 0)])
        .generate(&mut ())
        .unwrap();
    assert_eq!(space.final_state_count(), 1);
    assert_eq!(space.len(), 1);
    let last = space.final_states().next().unwrap();
    assert_eq!(space.state(last).unwrap().heap(), &abstracted);
}

#[test]
fn test_states_beyond_exploration_bound_stay_unexplored() {
    let fixture = ListFixture::new();
    let program = long_program();
    let bounded = |state: &ProgramState, _: &StateSpace| state.pc() < 3;
    let config = list_config(&fixture).with_exploration(bounded);

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(single_node(&fixture), 0))
        .generate(&mut ())
        .unwrap();
    assert_eq!(space.len(), 4);
    assert_eq!(space.final_state_count(), 0);
}
