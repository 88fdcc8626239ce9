use std::hash::BuildHasher;

use hyperheap_graph::{GraphError, HeapConfiguration, Morphism, MorphismKind, MorphismSearch};
use log::debug;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;

/// Summary of a method for one calling context: the heaps the method can
/// leave behind when started on `precondition`.
///
/// Postconditions share the external nodes of the precondition, position by
/// position, and are kept free of isomorphic duplicates.
#[derive(Clone, Debug)]
pub struct Contract {
    precondition: HeapConfiguration,
    postconditions: Vec<HeapConfiguration>,
}

impl Contract {
    pub fn new(
        precondition: HeapConfiguration,
        postconditions: impl IntoIterator<Item = HeapConfiguration>,
    ) -> Self {
        let mut contract = Self {
            precondition,
            postconditions: Vec::new(),
        };
        contract.add_postconditions(postconditions);
        contract
    }

    pub fn precondition(&self) -> &HeapConfiguration {
        &self.precondition
    }

    pub fn postconditions(&self) -> &[HeapConfiguration] {
        &self.postconditions
    }

    /// Returns the number of postconditions that were not known before.
    fn add_postconditions(&mut self, postconditions: impl IntoIterator<Item = HeapConfiguration>) -> usize {
        let before = self.postconditions.len();
        for postcondition in postconditions {
            if !self.postconditions.contains(&postcondition) {
                self.postconditions.push(postcondition);
            }
        }
        self.postconditions.len() - before
    }
}

/// Result of [`ContractCollection::match_contract`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractLookup<'a> {
    /// A contract whose precondition equals the heap up to the order of its
    /// external nodes. External `i` of the stored precondition corresponds to
    /// external `permutation[i]` of the heap that was looked up.
    Match {
        postconditions: &'a [HeapConfiguration],
        permutation: Vec<usize>,
    },
    NoMatch,
}

impl ContractLookup<'_> {
    pub fn is_match(&self) -> bool {
        matches!(self, ContractLookup::Match { .. })
    }
}

/// The contracts of one method, bucketed by the isomorphism-invariant hash of
/// their preconditions.
#[derive(Clone, Debug, Default)]
pub struct ContractCollection {
    buckets: FxHashMap<u64, SmallVec<[Contract; 1]>>,
}

impl ContractCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(SmallVec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.buckets.values().flatten()
    }

    /// Store `contract`, or merge its postconditions into the contract with
    /// the same precondition. Returns whether the collection changed.
    pub fn add_contract(&mut self, contract: Contract) -> Result<bool, GraphError> {
        let hash = FxBuildHasher.hash_one(&contract.precondition);
        let bucket = self.buckets.entry(hash).or_default();
        for existing in bucket.iter_mut() {
            let Some(morphism) = precondition_match(&existing.precondition, &contract.precondition) else {
                continue;
            };
            let permutation = external_permutation(&existing.precondition, &contract.precondition, &morphism);
            let aligned = contract
                .postconditions
                .iter()
                .map(|postcondition| reorder_externals(postcondition, &permutation))
                .collect::<Result<Vec<_>, _>>()?;
            let added = existing.add_postconditions(aligned);
            debug!("merged {added} new postconditions into an existing contract");
            return Ok(added > 0);
        }
        debug!(
            "new contract with {} postconditions",
            contract.postconditions.len()
        );
        bucket.push(contract);
        Ok(true)
    }

    /// Look up the contract whose precondition matches `heap` up to the order
    /// of external nodes.
    pub fn match_contract(&self, heap: &HeapConfiguration) -> ContractLookup<'_> {
        let hash = FxBuildHasher.hash_one(heap);
        let Some(bucket) = self.buckets.get(&hash) else {
            return ContractLookup::NoMatch;
        };
        for contract in bucket {
            if let Some(morphism) = precondition_match(&contract.precondition, heap) {
                return ContractLookup::Match {
                    postconditions: &contract.postconditions,
                    permutation: external_permutation(&contract.precondition, heap, &morphism),
                };
            }
        }
        ContractLookup::NoMatch
    }
}

/// Isomorphism that may permute the external nodes.
pub(crate) fn precondition_match(
    precondition: &HeapConfiguration,
    heap: &HeapConfiguration,
) -> Option<Morphism> {
    MorphismSearch::new(
        precondition,
        heap,
        MorphismKind::Isomorphism {
            ordered_externals: false,
        },
    )
    .find_first()
}

/// `result[i]` is the position in `heap` of the image of external `i` of
/// `precondition`.
fn external_permutation(
    precondition: &HeapConfiguration,
    heap: &HeapConfiguration,
    morphism: &Morphism,
) -> Vec<usize> {
    precondition
        .externals()
        .iter()
        .filter_map(|node| heap.external_index_of(morphism.image(*node)))
        .collect()
}

/// `heap` with external `i` moved to position `j` where `permutation[j] == i`.
fn reorder_externals(heap: &HeapConfiguration, permutation: &[usize]) -> Result<HeapConfiguration, GraphError> {
    let externals = heap.externals().to_vec();
    if permutation.len() != externals.len() || permutation.iter().any(|i| *i >= externals.len()) {
        return Err(GraphError::BadPermutation(permutation.to_vec()));
    }
    let mut builder = heap.clone().builder();
    for node in &externals {
        builder.unset_external(*node);
    }
    for position in permutation {
        builder.set_external(externals[*position]);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperheap_graph::{Node, Selector, SymbolTable, Type};

    struct Fixture {
        node: Type,
        next: Selector,
        prev: Selector,
    }

    fn fixture() -> Fixture {
        let mut symbols = SymbolTable::new();
        Fixture {
            node: symbols.ty("Node"),
            next: symbols.selector("next"),
            prev: symbols.selector("prev"),
        }
    }

    /// `a -sel-> b` with externals in the given order of `[a, b]`.
    fn link(f: &Fixture, selector: Selector, reversed: bool) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(f.node, 2);
        builder.add_selector(nodes[0], selector, nodes[1]).unwrap();
        let order: [Node; 2] = if reversed {
            [nodes[1], nodes[0]]
        } else {
            [nodes[0], nodes[1]]
        };
        builder.set_external(order[0]).set_external(order[1]);
        builder.build()
    }

    #[test]
    fn test_empty_collection_has_no_match() {
        let f = fixture();
        let contracts = ContractCollection::new();
        assert_eq!(contracts.match_contract(&link(&f, f.next, false)), ContractLookup::NoMatch);
    }

    #[test]
    fn test_identical_precondition_matches_with_identity() {
        let f = fixture();
        let mut contracts = ContractCollection::new();
        let precondition = link(&f, f.next, false);
        assert!(contracts.add_contract(Contract::new(precondition.clone(), [])).unwrap());

        let ContractLookup::Match {
            postconditions,
            permutation,
        } = contracts.match_contract(&precondition)
        else {
            panic!("expected a match");
        };
        assert!(postconditions.is_empty());
        assert_eq!(permutation, vec![0, 1]);
        assert!(!contracts.match_contract(&link(&f, f.prev, false)).is_match());
    }

    #[test]
    fn test_reversed_externals_yield_permutation() {
        let f = fixture();
        let mut contracts = ContractCollection::new();
        contracts
            .add_contract(Contract::new(link(&f, f.next, false), []))
            .unwrap();

        let lookup = contracts.match_contract(&link(&f, f.next, true));
        let ContractLookup::Match { permutation, .. } = lookup else {
            panic!("expected a match");
        };
        assert_eq!(permutation, vec![1, 0]);
    }

    #[test]
    fn test_merging_postconditions_reports_changes() {
        let f = fixture();
        let mut contracts = ContractCollection::new();
        let precondition = link(&f, f.next, false);
        let post = link(&f, f.prev, false);

        assert!(contracts.add_contract(Contract::new(precondition.clone(), [post.clone()])).unwrap());
        assert!(!contracts.add_contract(Contract::new(precondition.clone(), [post.clone()])).unwrap());
        assert_eq!(contracts.len(), 1);

        // the same contract seen with swapped externals adds nothing new
        let swapped = Contract::new(link(&f, f.next, true), [link(&f, f.prev, true)]);
        assert!(!contracts.add_contract(swapped).unwrap());

        let other = link(&f, f.prev, true);
        assert!(contracts.add_contract(Contract::new(precondition, [other])).unwrap());
        let contract = contracts.contracts().next().unwrap();
        assert_eq!(contract.postconditions().len(), 2);
    }
}
