use crate::{Index, Label, SymbolTable};

/// Label of a nonterminal hyperedge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nonterminal {
    Basic(Label),
    Indexed(IndexedNonterminal),
}

/// A nonterminal carrying an index string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexedNonterminal {
    pub label: Label,
    pub index: Index,
}

impl From<Label> for Nonterminal {
    fn from(label: Label) -> Self {
        Nonterminal::Basic(label)
    }
}

impl From<IndexedNonterminal> for Nonterminal {
    fn from(nonterminal: IndexedNonterminal) -> Self {
        Nonterminal::Indexed(nonterminal)
    }
}

impl Nonterminal {
    pub fn indexed(label: Label, index: Index) -> Self {
        Nonterminal::Indexed(IndexedNonterminal { label, index })
    }

    pub fn label(&self) -> Label {
        match self {
            Nonterminal::Basic(label) => *label,
            Nonterminal::Indexed(nt) => nt.label,
        }
    }

    pub fn rank(&self) -> usize {
        self.label().rank()
    }

    pub fn is_reduction_tentacle(&self, tentacle: usize) -> bool {
        self.label().is_reduction_tentacle(tentacle)
    }

    pub fn index(&self) -> Option<&Index> {
        match self {
            Nonterminal::Basic(_) => None,
            Nonterminal::Indexed(nt) => Some(&nt.index),
        }
    }

    /// Same nonterminal with a different index. Basic labels become indexed.
    pub fn with_index(&self, index: Index) -> Nonterminal {
        Nonterminal::indexed(self.label(), index)
    }

    /// Labels agree once indices are ignored.
    pub fn same_base(&self, other: &Nonterminal) -> bool {
        self.label() == other.label()
    }

    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> impl std::fmt::Display + 'a {
        DisplayNonterminal {
            nonterminal: self,
            symbols,
        }
    }
}

struct DisplayNonterminal<'a> {
    nonterminal: &'a Nonterminal,
    symbols: &'a SymbolTable,
}

impl std::fmt::Display for DisplayNonterminal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbols.label_name(self.nonterminal.label()))?;
        if let Some(index) = self.nonterminal.index() {
            write!(f, "{}", index.display(self.symbols))?;
        }
        Ok(())
    }
}
