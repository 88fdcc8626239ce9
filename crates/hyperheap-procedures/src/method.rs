use hyperheap_statespace::Semantics;

use crate::{ContractCollection, ProcedureContext};

arena_id! {
    /// Identifies a method declared in a [`ProcedureContext`].
    struct MethodId
}

/// Statements of a method body, indexed by program counter.
pub type MethodBody = Vec<Box<dyn Semantics<ProcedureContext>>>;

/// A method and everything known about its behavior so far.
#[derive(Clone, Debug)]
pub struct Method {
    name: String,
    contracts: ContractCollection,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contracts: ContractCollection::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contracts(&self) -> &ContractCollection {
        &self.contracts
    }

    pub fn contracts_mut(&mut self) -> &mut ContractCollection {
        &mut self.contracts
    }
}
