use std::sync::Arc;

use hyperheap_graph::{
    Grammar, HeapConfiguration, Index, IndexGrammar, IndexSymbol, Label, Node, Nonterminal,
    Selector, SymbolTable, Type,
};

/// AVL trees encoded by the indexed nonterminal `B`, whose index counts the
/// tree height. Selectors carry the balance of their source node, e.g.
/// `left_1` is the left child of a left-heavy node.
pub struct BalancedTreeFixture {
    pub symbols: SymbolTable,
    pub tree: Type,
    pub left: Selector,
    pub right: Selector,
    pub left_heavy: Selector,
    pub right_light: Selector,
    pub left_light: Selector,
    pub right_heavy: Selector,
    pub parent: Selector,
    pub b: Label,
    pub s: IndexSymbol,
    pub z: IndexSymbol,
    pub x: IndexSymbol,
    pub index_grammar: IndexGrammar,
    pub grammar: Arc<Grammar>,
}

impl Default for BalancedTreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl BalancedTreeFixture {
    pub fn new() -> Self {
        let mut symbols = SymbolTable::new();
        let index_grammar = IndexGrammar::standard(&mut symbols).expect("fresh symbol table");
        let tree = symbols.ty("AVLTree");
        let b = symbols
            .nonterminal("B", &[false, true])
            .expect("fresh symbol table");
        let s = symbols.concrete_symbol("s", false).expect("interned as concrete");
        let z = symbols.concrete_symbol("Z", true).expect("interned as bottom");
        let x = symbols.abstract_symbol("X").expect("interned as abstract");
        let mut fixture = Self {
            tree,
            left: symbols.selector("left_0"),
            right: symbols.selector("right_0"),
            left_heavy: symbols.selector("left_1"),
            right_light: symbols.selector("right_-1"),
            left_light: symbols.selector("left_-1"),
            right_heavy: symbols.selector("right_1"),
            parent: symbols.selector("parent"),
            symbols,
            b,
            s,
            z,
            x,
            index_grammar,
            grammar: Arc::new(Grammar::default()),
        };
        fixture.grammar = Arc::new(fixture.build_grammar());
        fixture
    }

    pub fn index(&self, symbols: &[IndexSymbol]) -> Index {
        Index::new(symbols.iter().copied()).expect("only the last symbol is not concrete")
    }

    /// `B` with the given index.
    pub fn nonterminal(&self, symbols: &[IndexSymbol]) -> Nonterminal {
        Nonterminal::indexed(self.b, self.index(symbols))
    }

    fn build_grammar(&self) -> Grammar {
        let (s, z, var) = (self.s, self.z, IndexSymbol::Variable);
        Grammar::builder()
            .add_rule(self.nonterminal(&[s, var]), self.balanced_rule())
            .and_then(|g| {
                g.add_rule(
                    self.nonterminal(&[s, s, var]),
                    self.unbalanced_rule(self.left_heavy, self.right_light, [&[s, var], &[var]]),
                )
            })
            .and_then(|g| {
                g.add_rule(
                    self.nonterminal(&[s, s, var]),
                    self.unbalanced_rule(self.left_light, self.right_heavy, [&[var], &[s, var]]),
                )
            })
            .and_then(|g| g.add_rule(self.nonterminal(&[z]), self.leaf_rule()))
            .and_then(|g| g.add_rule(self.nonterminal(&[s, z]), self.half_leaf_rule(self.left_heavy, self.right_light)))
            .and_then(|g| g.add_rule(self.nonterminal(&[s, z]), self.half_leaf_rule(self.right_heavy, self.left_light)))
            .expect("tree rules have rank 2")
            .build()
    }

    /// Root with two subtrees of equal height, externals `[root, end]`.
    fn balanced_rule(&self) -> HeapConfiguration {
        let var = IndexSymbol::Variable;
        self.unbalanced_rule(self.left, self.right, [&[var], &[var]])
    }

    fn unbalanced_rule(
        &self,
        left: Selector,
        right: Selector,
        [left_index, right_index]: [&[IndexSymbol]; 2],
    ) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.tree, 4);
        self.link(&mut builder, nodes[0], left, nodes[1]);
        self.link(&mut builder, nodes[0], right, nodes[2]);
        builder
            .add_edge(self.nonterminal(left_index), &[nodes[1], nodes[3]])
            .expect("rank 2");
        builder
            .add_edge(self.nonterminal(right_index), &[nodes[2], nodes[3]])
            .expect("rank 2");
        builder.set_external(nodes[0]).set_external(nodes[3]);
        builder.build()
    }

    /// A leaf whose children are both the end node.
    fn leaf_rule(&self) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.tree, 2);
        builder.add_selector(nodes[0], self.left, nodes[1]).expect("fresh node");
        builder.add_selector(nodes[0], self.right, nodes[1]).expect("fresh node");
        builder.set_external(nodes[0]).set_external(nodes[1]);
        builder.build()
    }

    /// A node with one leaf child on the `child` side.
    fn half_leaf_rule(&self, child: Selector, other: Selector) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.tree, 3);
        self.link(&mut builder, nodes[0], child, nodes[1]);
        builder.add_selector(nodes[0], other, nodes[2]).expect("fresh node");
        builder
            .add_edge(self.nonterminal(&[self.z]), &[nodes[1], nodes[2]])
            .expect("rank 2");
        builder.set_external(nodes[0]).set_external(nodes[2]);
        builder.build()
    }

    fn link(&self, builder: &mut hyperheap_graph::HeapBuilder, from: Node, selector: Selector, to: Node) {
        builder.add_selector(from, selector, to).expect("fresh node");
        builder.add_selector(to, self.parent, from).expect("fresh node");
    }

    /// A root whose balanced children carry `B[s, s, Z]` subtrees.
    pub fn concrete_tree(&self) -> HeapConfiguration {
        let (s, z) = (self.s, self.z);
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.tree, 4);
        self.link(&mut builder, nodes[0], self.left, nodes[1]);
        self.link(&mut builder, nodes[0], self.right, nodes[2]);
        builder
            .add_edge(self.nonterminal(&[s, s, z]), &[nodes[1], nodes[3]])
            .expect("rank 2");
        builder
            .add_edge(self.nonterminal(&[s, s, z]), &[nodes[2], nodes[3]])
            .expect("rank 2");
        builder.build()
    }
}
