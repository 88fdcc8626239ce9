use hyperheap::prelude::*;
use hyperheap::statespace::strategy::GarbageCollector;
use hyperheap_test_utils::ListFixture;
use hyperheap_test_utils::toy::{FieldAccess, IfNull, Return, Terminal};
use test_log::test;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn list_canonicalization(fixture: &ListFixture) -> CanonicalizationStrategy {
    CanonicalizationStrategy::builder()
        .grammar(fixture.grammar.clone())
        .build()
}

fn list_config(fixture: &ListFixture) -> GeneratorConfig {
    GeneratorConfig::new(MaterializationStrategy::new(fixture.grammar.clone()))
}

/// ```text
/// 0: if v == null goto 2
/// 1: v = v.next; goto 0
/// 2: return
/// ```
fn iteration(fixture: &ListFixture, variable: Name, locals: &[Name]) -> Vec<Box<dyn Semantics>> {
    vec![
        Box::new(IfNull {
            variable,
            null: fixture.symbols.null_name(),
            then: 2,
            otherwise: 1,
        }),
        Box::new(FieldAccess {
            lhs: variable,
            rhs: variable,
            selector: fixture.next,
            next: 0,
        }),
        Box::new(Return::new(3, locals.iter().copied())),
        Box::new(Terminal),
    ]
}

// ---------------------------------------------------------------------------
// Intraprocedural
// ---------------------------------------------------------------------------

#[test]
fn test_abstract_traversal_ends_in_canonical_states() {
    let mut fixture = ListFixture::new();
    let x = fixture.variable("x");
    let program = iteration(&fixture, x, &[]);
    let canonicalization = list_canonicalization(&fixture);
    let config = list_config(&fixture)
        .with_canonicalization(CanonicalizationPolicy::single(canonicalization.clone()))
        .with_refinement(GarbageCollector);

    let space = StateSpaceGenerator::new(&program, config)
        .with_initial_state(ProgramState::new(fixture.abstract_list("x"), 0))
        .generate(&mut ())
        .unwrap();

    assert_eq!(space.final_state_count(), 1);
    for id in space.final_states() {
        let heap = space.state(id).unwrap().heap();
        assert_eq!(
            &canonicalization.canonicalize(heap.clone(), AbstractionMode::Admissible),
            heap
        );
    }
}

// ---------------------------------------------------------------------------
// Interprocedural
// ---------------------------------------------------------------------------

#[test]
fn test_recursion_agrees_with_iteration() {
    let mut fixture = ListFixture::new();
    let param = fixture.variable("@param0");
    let x = fixture.variable("x");
    let null = fixture.symbols.null_name();
    let heap = fixture.null_terminated(3, "@param0");

    let program = iteration(&fixture, param, &[param]);
    let iterated = StateSpaceGenerator::new(&program, list_config(&fixture))
        .with_initial_state(ProgramState::new(heap.clone(), 0))
        .generate(&mut ())
        .unwrap();
    let expected: Vec<HeapConfiguration> = iterated
        .final_states()
        .map(|id| iterated.state(id).unwrap().heap().clone())
        .collect();
    assert_eq!(expected.len(), 1);

    let mut analysis = InterproceduralAnalysis::new(list_config(&fixture), fixture.symbols.clone());
    let traverse = analysis.declare("traverse");
    let body: MethodBody = vec![
        Box::new(IfNull {
            variable: param,
            null,
            then: 3,
            otherwise: 1,
        }),
        Box::new(FieldAccess {
            lhs: x,
            rhs: param,
            selector: fixture.next,
            next: 2,
        }),
        Box::new(Call::new(traverse, 3).with_argument(param, x)),
        Box::new(Return::new(4, [x])),
        Box::new(Terminal),
    ];
    analysis.define(traverse, body).unwrap();
    analysis.add_call(traverse, heap.clone());
    analysis.run().unwrap();

    let ContractLookup::Match { postconditions, .. } =
        analysis.contracts(traverse).match_contract(&heap)
    else {
        panic!("the analyzed call has a contract");
    };
    assert_eq!(postconditions, expected.as_slice());
}
