use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::index::IndexSymbol;
use crate::intern::InternTable;
use crate::{GraphError, intern_key};

intern_key! {
    /// Nominal type of a heap node.
    struct Type
}

intern_key! {
    /// Label of a selector (pointer field) edge.
    struct Selector
}

intern_key! {
    /// Name of a program variable or constant.
    struct Name
}

intern_key! {
    struct LabelId
}

intern_key! {
    struct SymbolId
}

/// Type of the node every `null` reference points to.
pub const NULL_TYPE: &str = "NULL";
/// Name of the constant variable attached to the null node.
pub const NULL_NAME: &str = "null";
/// Variable names that denote constants rather than program variables.
pub const CONSTANT_NAMES: [&str; 6] = ["null", "true", "false", "0", "1", "-1"];
const PARAMETER_PREFIXES: [&str; 2] = ["@param", "@this"];

/// A nonterminal label: identity, rank, and reduction tentacles.
///
/// Rank and reduction tentacles are fixed the first time a name is interned,
/// so two labels with the same id are always identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    id: LabelId,
    rank: usize,
    reduction: u64,
}

impl Label {
    pub fn id(self) -> LabelId {
        self.id
    }

    pub fn rank(self) -> usize {
        self.rank
    }

    /// Whether the given tentacle has already been reduced, in which case
    /// reachability does not continue through it.
    pub fn is_reduction_tentacle(self, tentacle: usize) -> bool {
        tentacle < self.rank && self.reduction & (1 << tentacle) != 0
    }
}

/// Session-wide symbol store.
///
/// Every symbol used by heaps and grammars of one analysis is interned here.
/// Strategies that run during exploration only see the read-only
/// [`Constants`] and [`FieldTable`] snapshots, so the table itself stays
/// with its owner.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    types: InternTable<String, Type>,
    fields: FxHashMap<Type, SmallVec<[Selector; 4]>>,
    constant_types: FxHashSet<Type>,
    selectors: InternTable<String, Selector>,
    names: InternTable<String, Name>,
    labels: InternTable<String, LabelId>,
    label_info: Vec<Label>,
    index_symbols: InternTable<String, SymbolId>,
    index_kinds: Vec<IndexSymbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            types: InternTable::new(),
            fields: FxHashMap::default(),
            constant_types: FxHashSet::default(),
            selectors: InternTable::new(),
            names: InternTable::new(),
            labels: InternTable::new(),
            label_info: Vec::new(),
            index_symbols: InternTable::new(),
            index_kinds: Vec::new(),
        };
        table.constant_type(NULL_TYPE);
        for name in CONSTANT_NAMES {
            table.variable(name);
        }
        table
    }

    // -- Types ------------------------------------------------------------

    pub fn ty(&mut self, name: &str) -> Type {
        self.types.intern(name.to_string())
    }

    /// Intern a type together with the selectors every object of it carries.
    pub fn declare_type(&mut self, name: &str, fields: &[&str]) -> Type {
        let ty = self.ty(name);
        let selectors: SmallVec<[Selector; 4]> =
            fields.iter().map(|field| self.selector(field)).collect();
        let declared = self.fields.entry(ty).or_default();
        for selector in selectors {
            if !declared.contains(&selector) {
                declared.push(selector);
            }
        }
        ty
    }

    /// Intern a type whose nodes stand for constants (e.g. the null node).
    pub fn constant_type(&mut self, name: &str) -> Type {
        let ty = self.ty(name);
        self.constant_types.insert(ty);
        ty
    }

    pub fn fields(&self, ty: Type) -> &[Selector] {
        self.fields.get(&ty).map(|f| f.as_slice()).unwrap_or(&[])
    }

    pub fn null_type(&self) -> Type {
        // interned by `new`
        self.types.get(NULL_TYPE).unwrap_or(Type(0))
    }

    // -- Selectors and variables -------------------------------------------

    pub fn selector(&mut self, name: &str) -> Selector {
        self.selectors.intern(name.to_string())
    }

    pub fn variable(&mut self, name: &str) -> Name {
        self.names.intern(name.to_string())
    }

    pub fn null_name(&self) -> Name {
        self.names.get(NULL_NAME).unwrap_or(Name(0))
    }

    pub fn is_constant(&self, name: Name) -> bool {
        CONSTANT_NAMES.contains(&self.variable_name(name))
    }

    /// Whether the variable holds an argument of the current method.
    pub fn is_parameter(&self, name: Name) -> bool {
        let name = self.variable_name(name);
        PARAMETER_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
    }

    // -- Nonterminals ------------------------------------------------------

    /// Intern a nonterminal whose rank is the number of reduction flags.
    pub fn nonterminal(&mut self, name: &str, reduction: &[bool]) -> Result<Label, GraphError> {
        let rank = reduction.len();
        if rank > 64 {
            return Err(GraphError::RankTooLarge {
                name: name.to_string(),
                rank,
            });
        }
        let mask = reduction
            .iter()
            .enumerate()
            .filter(|(_, reduced)| **reduced)
            .fold(0u64, |mask, (tentacle, _)| mask | (1 << tentacle));

        if let Some(id) = self.labels.get(name) {
            let declared = self.label_info[id.0];
            if declared.rank != rank || declared.reduction != mask {
                return Err(GraphError::RankMismatch {
                    name: name.to_string(),
                    declared: declared.rank,
                    requested: rank,
                });
            }
            return Ok(declared);
        }

        let id = self.labels.intern(name.to_string());
        let label = Label {
            id,
            rank,
            reduction: mask,
        };
        self.label_info.push(label);
        Ok(label)
    }

    /// Intern a nonterminal of the given rank without reduction tentacles.
    pub fn nonterminal_of_rank(&mut self, name: &str, rank: usize) -> Result<Label, GraphError> {
        self.nonterminal(name, &vec![false; rank])
    }

    pub fn lookup_nonterminal(&self, name: &str) -> Option<Label> {
        self.labels.get(name).map(|id| self.label_info[id.0])
    }

    // -- Index symbols -----------------------------------------------------

    pub fn concrete_symbol(&mut self, name: &str, bottom: bool) -> Result<IndexSymbol, GraphError> {
        self.index_symbol(name, |id| IndexSymbol::Concrete { id, bottom })
    }

    pub fn abstract_symbol(&mut self, name: &str) -> Result<IndexSymbol, GraphError> {
        self.index_symbol(name, IndexSymbol::Abstract)
    }

    fn index_symbol(
        &mut self,
        name: &str,
        make: impl FnOnce(SymbolId) -> IndexSymbol,
    ) -> Result<IndexSymbol, GraphError> {
        if let Some(id) = self.index_symbols.get(name) {
            let existing = self.index_kinds[id.0];
            return if existing == make(id) {
                Ok(existing)
            } else {
                Err(GraphError::SymbolKindConflict(name.to_string()))
            };
        }
        let id = self.index_symbols.intern(name.to_string());
        let symbol = make(id);
        self.index_kinds.push(symbol);
        Ok(symbol)
    }

    // -- Resolution --------------------------------------------------------

    pub fn type_name(&self, ty: Type) -> &str {
        self.types.resolve(ty).map(String::as_str).unwrap_or("?")
    }

    pub fn selector_name(&self, selector: Selector) -> &str {
        self.selectors
            .resolve(selector)
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn variable_name(&self, name: Name) -> &str {
        self.names.resolve(name).map(String::as_str).unwrap_or("?")
    }

    pub fn label_name(&self, label: Label) -> &str {
        self.labels
            .resolve(label.id)
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn symbol_name(&self, symbol: IndexSymbol) -> &str {
        match symbol {
            IndexSymbol::Concrete { id, .. } | IndexSymbol::Abstract(id) => self
                .index_symbols
                .resolve(id)
                .map(String::as_str)
                .unwrap_or("?"),
            IndexSymbol::Variable => "()",
        }
    }

    // -- Snapshots ---------------------------------------------------------

    pub fn constants(&self) -> Constants {
        let names = CONSTANT_NAMES
            .iter()
            .filter_map(|name| self.names.get(*name))
            .collect();
        Constants {
            names,
            types: self.constant_types.clone(),
            null_name: self.names.get(NULL_NAME),
            null_type: self.types.get(NULL_TYPE),
        }
    }

    pub fn field_table(&self) -> FieldTable {
        FieldTable(self.fields.clone())
    }
}

/// Read-only view of which names and types denote constants.
#[derive(Clone, Debug, Default)]
pub struct Constants {
    names: FxHashSet<Name>,
    types: FxHashSet<Type>,
    null_name: Option<Name>,
    null_type: Option<Type>,
}

impl Constants {
    pub fn is_constant_name(&self, name: Name) -> bool {
        self.names.contains(&name)
    }

    pub fn is_constant_type(&self, ty: Type) -> bool {
        self.types.contains(&ty)
    }

    pub fn null_name(&self) -> Option<Name> {
        self.null_name
    }

    pub fn null_type(&self) -> Option<Type> {
        self.null_type
    }
}

/// Read-only view of the selectors declared per type.
#[derive(Clone, Debug, Default)]
pub struct FieldTable(FxHashMap<Type, SmallVec<[Selector; 4]>>);

impl FieldTable {
    pub fn fields(&self, ty: Type) -> &[Selector] {
        self.0.get(&ty).map(|f| f.as_slice()).unwrap_or(&[])
    }
}
