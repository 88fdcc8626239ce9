use smallvec::SmallVec;

use crate::{GraphError, SymbolId, SymbolTable};

/// One position of an [`Index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexSymbol {
    /// A fixed symbol; bottom symbols terminate an index.
    Concrete { id: SymbolId, bottom: bool },
    /// A symbol standing for every index the index grammar derives from it.
    Abstract(SymbolId),
    /// Placeholder in rule left-hand sides, instantiated while matching.
    Variable,
}

impl IndexSymbol {
    pub fn is_concrete(self) -> bool {
        matches!(self, IndexSymbol::Concrete { .. })
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, IndexSymbol::Concrete { bottom: true, .. })
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, IndexSymbol::Abstract(_))
    }

    pub fn is_variable(self) -> bool {
        matches!(self, IndexSymbol::Variable)
    }
}

/// Sequence of index symbols attached to an indexed nonterminal.
///
/// Only the trailing symbol may be abstract or a variable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index(SmallVec<[IndexSymbol; 4]>);

impl Index {
    pub fn new(symbols: impl IntoIterator<Item = IndexSymbol>) -> Result<Self, GraphError> {
        let symbols: SmallVec<[IndexSymbol; 4]> = symbols.into_iter().collect();
        let prefix = symbols.len().saturating_sub(1);
        if symbols[..prefix].iter().any(|s| !s.is_concrete()) {
            return Err(GraphError::MalformedIndex);
        }
        Ok(Self(symbols))
    }

    pub fn symbols(&self) -> &[IndexSymbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<IndexSymbol> {
        self.0.last().copied()
    }

    pub fn ends_with(&self, symbol: IndexSymbol) -> bool {
        self.last() == Some(symbol)
    }

    /// The trailing symbol is a concrete bottom symbol.
    pub fn has_concrete_index(&self) -> bool {
        self.last().is_some_and(IndexSymbol::is_bottom)
    }

    pub fn is_concrete(&self) -> bool {
        self.0.iter().all(|s| s.is_concrete())
    }

    /// Index with the trailing symbol removed.
    pub fn shortened(&self) -> Index {
        let mut symbols = self.0.clone();
        symbols.pop();
        Index(symbols)
    }

    /// Index with the trailing symbol replaced by `postfix`.
    pub fn prolonged(&self, postfix: &[IndexSymbol]) -> Result<Index, GraphError> {
        let mut symbols = self.0.clone();
        symbols.pop();
        symbols.extend_from_slice(postfix);
        Index::new(symbols)
    }

    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> impl std::fmt::Display + 'a {
        DisplayIndex {
            index: self,
            symbols,
        }
    }
}

struct DisplayIndex<'a> {
    index: &'a Index,
    symbols: &'a SymbolTable,
}

impl std::fmt::Display for DisplayIndex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, symbol) in self.index.symbols().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", self.symbols.symbol_name(*symbol))?;
        }
        write!(f, "]")
    }
}

/// A right-regular rule family `A -> step A | base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRule {
    pub abstract_symbol: IndexSymbol,
    pub step: IndexSymbol,
    pub base: IndexSymbol,
}

/// The fixed index grammar shared by all indexed nonterminals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexGrammar {
    rules: SmallVec<[IndexRule; 2]>,
}

impl IndexGrammar {
    pub fn new(rules: impl IntoIterator<Item = IndexRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// `X -> sX | Z` and `Y -> sY | C`.
    pub fn standard(symbols: &mut SymbolTable) -> Result<Self, GraphError> {
        let s = symbols.concrete_symbol("s", false)?;
        let x = IndexRule {
            abstract_symbol: symbols.abstract_symbol("X")?,
            step: s,
            base: symbols.concrete_symbol("Z", true)?,
        };
        let y = IndexRule {
            abstract_symbol: symbols.abstract_symbol("Y")?,
            step: s,
            base: symbols.concrete_symbol("C", true)?,
        };
        Ok(Self::new([x, y]))
    }

    pub fn rules(&self) -> &[IndexRule] {
        &self.rules
    }

    pub fn rule_for(&self, symbol: IndexSymbol) -> Option<&IndexRule> {
        self.rules.iter().find(|rule| rule.abstract_symbol == symbol)
    }

    /// The right-hand side of the rule for `symbol` that starts with `first`.
    pub fn rule_creating(
        &self,
        symbol: IndexSymbol,
        first: IndexSymbol,
    ) -> Option<SmallVec<[IndexSymbol; 2]>> {
        let rule = self.rule_for(symbol)?;
        if first == rule.step {
            Some(smallvec::smallvec![rule.step, rule.abstract_symbol])
        } else if first == rule.base {
            Some(smallvec::smallvec![rule.base])
        } else {
            None
        }
    }

    /// All right-hand sides derivable in one step from `symbol`.
    pub fn right_hand_sides(&self, symbol: IndexSymbol) -> SmallVec<[SmallVec<[IndexSymbol; 2]>; 2]> {
        match self.rule_for(symbol) {
            Some(rule) => smallvec::smallvec![
                smallvec::smallvec![rule.step, rule.abstract_symbol],
                smallvec::smallvec![rule.base],
            ],
            None => SmallVec::new(),
        }
    }
}
