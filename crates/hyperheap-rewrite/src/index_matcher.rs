use hyperheap_graph::{Index, IndexGrammar, IndexSymbol};
use smallvec::SmallVec;

pub type Symbols = SmallVec<[IndexSymbol; 4]>;

/// How an index and a rule index fit together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexMatch {
    /// Replacement for the trailing abstract symbol of the heap index.
    /// Empty if the heap index can be used as is.
    pub materialization: Symbols,
    /// Suffix bound to the trailing variable of the rule index.
    /// Empty if the rule index has no variable.
    pub instantiation: Symbols,
}

impl IndexMatch {
    pub fn needs_materialization(&self) -> bool {
        !self.materialization.is_empty()
    }
}

/// Matches heap indices against rule indices using the index grammar.
#[derive(Clone, Debug)]
pub struct IndexMatcher {
    grammar: IndexGrammar,
}

impl IndexMatcher {
    pub fn new(grammar: IndexGrammar) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &IndexGrammar {
        &self.grammar
    }

    pub fn can_match(&self, materializable: &Index, instantiable: &Index) -> bool {
        self.compute_match(materializable, instantiable).is_some()
    }

    /// Align `materializable` (an index in the heap) with `instantiable`
    /// (an index of a rule, possibly ending in a variable).
    ///
    /// Abstract symbols of the heap index are unfolded as needed; a rule
    /// variable absorbs the remaining suffix. Returns `None` if the indices
    /// disagree on a concrete symbol, if the heap index runs out, or if a
    /// concrete heap symbol meets an abstract rule symbol.
    pub fn compute_match(&self, materializable: &Index, instantiable: &Index) -> Option<IndexMatch> {
        let heap = materializable.symbols();
        let rule = instantiable.symbols();
        let mut result = IndexMatch::default();

        let effective = |i: usize, materialization: &Symbols| -> Option<IndexSymbol> {
            if materialization.is_empty() || i + 1 < heap.len() {
                heap.get(i).copied()
            } else {
                materialization.get(i + 1 - heap.len()).copied()
            }
        };

        let mut i = 0;
        loop {
            let heap_len = if result.materialization.is_empty() {
                heap.len()
            } else {
                heap.len() - 1 + result.materialization.len()
            };
            if i >= heap_len.max(rule.len()) {
                break;
            }
            let current = effective(i, &result.materialization)?;
            let expected = rule.get(i).copied().unwrap_or(IndexSymbol::Variable);

            match (current, expected) {
                (IndexSymbol::Variable, _) => return None,
                (_, IndexSymbol::Variable) => result.instantiation.push(current),
                (IndexSymbol::Abstract(_), IndexSymbol::Concrete { .. }) => {
                    let rhs = self.grammar.rule_creating(current, expected)?;
                    result.materialization.pop();
                    result.materialization.extend(rhs);
                }
                (IndexSymbol::Concrete { .. }, IndexSymbol::Abstract(_)) => return None,
                (current, expected) if current != expected => return None,
                _ => {}
            }
            i += 1;
        }
        Some(result)
    }
}
