use hyperheap_graph::*;

// ---------------------------------------------------------------------------
// Shared list symbols
// ---------------------------------------------------------------------------

pub struct ListSymbols {
    pub symbols: SymbolTable,
    pub node: Type,
    pub next: Selector,
    pub list: Label,
}

impl ListSymbols {
    pub fn new() -> Self {
        let mut symbols = SymbolTable::new();
        let node = symbols.declare_type("Node", &["next"]);
        let next = symbols.selector("next");
        let list = symbols.nonterminal("List", &[false, true]).unwrap();
        Self {
            symbols,
            node,
            next,
            list,
        }
    }

    /// A chain of `length` nodes linked by `next`.
    pub fn chain(&self, length: usize) -> (HeapConfiguration, Vec<Node>) {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.node, length);
        for pair in nodes.windows(2) {
            builder.add_selector(pair[0], self.next, pair[1]).unwrap();
        }
        (builder.build(), nodes)
    }

    /// `List -> next(0, 2) + List(2, 1)`, externals `[0, 1]`.
    pub fn recursive_rule(&self) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.node, 3);
        builder.add_selector(nodes[0], self.next, nodes[2]).unwrap();
        builder.add_edge(self.list, &[nodes[2], nodes[1]]).unwrap();
        builder.set_external(nodes[0]).set_external(nodes[1]);
        builder.build()
    }
}
