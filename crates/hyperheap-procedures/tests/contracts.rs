mod common;

use common::*;
use hyperheap_graph::*;
use hyperheap_procedures::*;
use hyperheap_test_utils::ListFixture;
use test_log::test;

/// `c -next-> a`, `List(c, b)`, `@param0` at `c`, `x` at `a` and `y` at `b`.
/// The order in which `x` and `y` are attached decides the order of the
/// cutpoints.
fn call_site(fixture: &mut ListFixture, names: &Names, x_first: bool, target_b: bool) -> HeapConfiguration {
    let y = fixture.variable("y");
    let mut builder = HeapConfiguration::new().builder();
    let nodes = builder.add_nodes(fixture.node, 3);
    let (a, b, c) = (nodes[0], nodes[1], nodes[2]);
    let target = if target_b { b } else { a };
    builder.add_selector(c, fixture.next, target).unwrap();
    builder.add_edge(fixture.list, &[c, b]).unwrap();
    if x_first {
        builder.add_variable(names.x, a);
        builder.add_variable(y, b);
    } else {
        builder.add_variable(y, b);
        builder.add_variable(names.x, a);
    }
    builder.add_variable(names.param, c);
    builder.build()
}

/// The scope of [`call_site`] after the callee redirected `c.next` to `b`.
fn redirected(scope: &HeapConfiguration, fixture: &ListFixture, names: &Names) -> HeapConfiguration {
    let c = scope.variable_target(names.param).unwrap();
    let b = scope
        .attached_nodes(scope.edges().next().unwrap())[1];
    let mut builder = scope.clone().builder();
    builder.set_selector(c, fixture.next, b);
    builder.build()
}

// ---------------------------------------------------------------------------
// Scope extraction
// ---------------------------------------------------------------------------

#[test]
fn test_scope_exposes_variables_as_cutpoints() {
    let mut fixture = ListFixture::new();
    let names = Names::new(&mut fixture);
    let heap = call_site(&mut fixture, &names, true, false);
    let scoped = extract_scope(&heap, "update", &mut fixture.symbols).unwrap();

    let scope = scoped.in_scope();
    assert_eq!(scope.node_count(), 3);
    assert_eq!(scope.rank(), 2);
    assert_eq!(scope.edge_count(), 1);
    let c = scope.variable_target(names.param).unwrap();
    assert_eq!(scope.selector_target(c, fixture.next), scope.external_at(0));

    let outside = scoped.outside();
    assert_eq!(outside.node_count(), 2);
    assert_eq!(outside.edge_count(), 1);
    assert_eq!(outside.variable_count(), 2);
    assert!(fixture.symbols.lookup_nonterminal("update2").is_some());
}

// ---------------------------------------------------------------------------
// Matching and merging
// ---------------------------------------------------------------------------

#[test]
fn test_contract_applies_to_permuted_call_site() {
    let mut fixture = ListFixture::new();
    let names = Names::new(&mut fixture);
    let first = call_site(&mut fixture, &names, true, false);
    let second = call_site(&mut fixture, &names, false, false);

    let scoped_first = extract_scope(&first, "update", &mut fixture.symbols).unwrap();
    let scoped_second = extract_scope(&second, "update", &mut fixture.symbols).unwrap();
    assert_ne!(scoped_first.in_scope(), scoped_second.in_scope());

    let mut contracts = ContractCollection::new();
    let post = redirected(scoped_first.in_scope(), &fixture, &names);
    contracts
        .add_contract(Contract::new(scoped_first.in_scope().clone(), [post]))
        .unwrap();

    let ContractLookup::Match {
        postconditions,
        permutation,
    } = contracts.match_contract(scoped_second.in_scope())
    else {
        panic!("the call sites only differ in the order of cutpoints");
    };
    assert_eq!(permutation, vec![1, 0]);

    let merged = scoped_second
        .merge_postcondition(&postconditions[0], &permutation)
        .unwrap();
    assert_eq!(merged, call_site(&mut fixture, &names, false, true));
}

#[test]
fn test_identity_merge_restores_call_site() {
    let mut fixture = ListFixture::new();
    let names = Names::new(&mut fixture);
    let heap = call_site(&mut fixture, &names, true, false);
    let scoped = extract_scope(&heap, "update", &mut fixture.symbols).unwrap();

    let mut contracts = ContractCollection::new();
    contracts
        .add_contract(Contract::new(scoped.in_scope().clone(), [scoped.in_scope().clone()]))
        .unwrap();
    let ContractLookup::Match {
        postconditions,
        permutation,
    } = contracts.match_contract(scoped.in_scope())
    else {
        panic!("a heap matches its own contract");
    };
    assert_eq!(permutation, vec![0, 1]);
    assert_eq!(
        scoped
            .merge_postcondition(&postconditions[0], &permutation)
            .unwrap(),
        heap
    );
}
