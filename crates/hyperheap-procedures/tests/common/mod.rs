#![allow(dead_code)]

use hyperheap_graph::*;
use hyperheap_procedures::*;
use hyperheap_rewrite::MaterializationStrategy;
use hyperheap_statespace::GeneratorConfig;
use hyperheap_test_utils::ListFixture;
use hyperheap_test_utils::toy::{Branch, FieldAccess, IfNull, Return, Terminal};

// ---------------------------------------------------------------------------
// Analyses over the list grammar
// ---------------------------------------------------------------------------

pub fn list_config(fixture: &ListFixture) -> GeneratorConfig {
    GeneratorConfig::new(MaterializationStrategy::new(fixture.grammar.clone()))
}

/// Names shared by the method bodies below.
pub struct Names {
    pub param: Name,
    pub x: Name,
    pub null: Name,
}

impl Names {
    pub fn new(fixture: &mut ListFixture) -> Self {
        Self {
            param: fixture.variable("@param0"),
            x: fixture.variable("x"),
            null: fixture.symbols.null_name(),
        }
    }
}

/// ```text
/// 0: if @param0 == null goto 3
/// 1: x = @param0.next
/// 2: traverse(x)
/// 3: return
/// ```
pub fn traversal(fixture: &ListFixture, names: &Names, traverse: MethodId) -> MethodBody {
    vec![
        Box::new(IfNull {
            variable: names.param,
            null: names.null,
            then: 3,
            otherwise: 1,
        }),
        Box::new(FieldAccess {
            lhs: names.x,
            rhs: names.param,
            selector: fixture.next,
            next: 2,
        }),
        Box::new(Call::new(traverse, 3).with_argument(names.param, names.x)),
        Box::new(Return::new(4, [names.x])),
        Box::new(Terminal),
    ]
}

/// ```text
/// 0: goto 1 or 2
/// 1: spin(@param0)
/// 2: return
/// ```
pub fn spinning(names: &Names, spin: MethodId) -> MethodBody {
    vec![
        Box::new(Branch {
            targets: vec![1, 2],
        }),
        Box::new(Call::new(spin, 2).with_argument(names.param, names.param)),
        Box::new(Terminal),
    ]
}

/// A single `Node` with `@param0` attached.
pub fn parameter_node(fixture: &ListFixture, names: &Names) -> HeapConfiguration {
    let mut builder = HeapConfiguration::new().builder();
    let node = builder.add_node(fixture.node);
    builder.add_variable(names.param, node);
    builder.build()
}
