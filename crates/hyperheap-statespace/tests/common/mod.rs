use hyperheap_graph::*;
use hyperheap_rewrite::{CanonicalizationStrategy, MaterializationStrategy};
use hyperheap_statespace::*;
use hyperheap_test_utils::ListFixture;

// ---------------------------------------------------------------------------
// Program and configuration helpers
// ---------------------------------------------------------------------------

pub type Statements = Vec<Box<dyn Semantics>>;

pub fn list_config(fixture: &ListFixture) -> GeneratorConfig {
    GeneratorConfig::new(MaterializationStrategy::new(fixture.grammar.clone()))
}

pub fn list_canonicalization(fixture: &ListFixture) -> CanonicalizationStrategy {
    CanonicalizationStrategy::builder()
        .grammar(fixture.grammar.clone())
        .build()
}

/// A heap with a single node of type `Node`.
pub fn single_node(fixture: &ListFixture) -> HeapConfiguration {
    let mut builder = HeapConfiguration::new().builder();
    builder.add_node(fixture.node);
    builder.build()
}

pub fn states_at(space: &StateSpace, pc: ProgramCounter) -> Vec<&ProgramState> {
    space.states().filter(|state| state.pc() == pc).collect()
}
