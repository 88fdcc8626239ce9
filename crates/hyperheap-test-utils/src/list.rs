use std::sync::Arc;

use hyperheap_graph::{
    Grammar, HeapConfiguration, Label, Name, Node, Selector, SymbolTable, Type,
};

/// Singly linked lists of `Node` objects and the grammar
///
/// ```text
/// List -> next(0, 1)
///       | next(0, 2) List(2, 1)
///       | List(0, 2) List(2, 1)
/// ```
pub struct ListFixture {
    pub symbols: SymbolTable,
    pub node: Type,
    pub next: Selector,
    pub list: Label,
    pub grammar: Arc<Grammar>,
}

impl Default for ListFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ListFixture {
    pub fn new() -> Self {
        let mut symbols = SymbolTable::new();
        let node = symbols.declare_type("Node", &["next"]);
        let next = symbols.selector("next");
        let list = symbols
            .nonterminal("List", &[false, true])
            .expect("fresh symbol table");
        let mut fixture = Self {
            symbols,
            node,
            next,
            list,
            grammar: Arc::new(Grammar::default()),
        };
        let grammar = Grammar::builder()
            .add_rule(list, fixture.base_rule())
            .and_then(|g| g.add_rule(list, fixture.recursive_rule()))
            .and_then(|g| g.add_rule(list, fixture.concatenation_rule()))
            .expect("list rules have rank 2")
            .build();
        fixture.grammar = Arc::new(grammar);
        fixture
    }

    /// `next(0, 1)`, externals `[0, 1]`.
    pub fn base_rule(&self) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.node, 2);
        builder.add_selector(nodes[0], self.next, nodes[1]).expect("fresh node");
        builder.set_external(nodes[0]).set_external(nodes[1]);
        builder.build()
    }

    /// `next(0, 2) List(2, 1)`, externals `[0, 1]`.
    pub fn recursive_rule(&self) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.node, 3);
        builder.add_selector(nodes[0], self.next, nodes[2]).expect("fresh node");
        builder.add_edge(self.list, &[nodes[2], nodes[1]]).expect("rank 2");
        builder.set_external(nodes[0]).set_external(nodes[1]);
        builder.build()
    }

    /// `List(0, 2) List(2, 1)`, externals `[0, 1]`.
    pub fn concatenation_rule(&self) -> HeapConfiguration {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.node, 3);
        builder.add_edge(self.list, &[nodes[0], nodes[2]]).expect("rank 2");
        builder.add_edge(self.list, &[nodes[2], nodes[1]]).expect("rank 2");
        builder.set_external(nodes[0]).set_external(nodes[1]);
        builder.build()
    }

    /// A chain of `length` nodes linked by `next`.
    pub fn chain(&self, length: usize) -> (HeapConfiguration, Vec<Node>) {
        let mut builder = HeapConfiguration::new().builder();
        let nodes = builder.add_nodes(self.node, length);
        for pair in nodes.windows(2) {
            builder.add_selector(pair[0], self.next, pair[1]).expect("fresh node");
        }
        (builder.build(), nodes)
    }

    /// A chain of `length` nodes ending in the null node, with `head`
    /// pointing at the first node and `null` at the null node.
    pub fn null_terminated(&mut self, length: usize, head: &str) -> HeapConfiguration {
        let head = self.symbols.variable(head);
        let null = self.symbols.null_name();
        let null_type = self.symbols.null_type();
        let (heap, nodes) = self.chain(length);
        let mut builder = heap.builder();
        let null_node = builder.add_node(null_type);
        match nodes.last() {
            Some(last) => {
                builder.add_selector(*last, self.next, null_node).expect("chain end");
                builder.add_variable(head, nodes[0]);
            }
            None => {
                builder.add_variable(head, null_node);
            }
        }
        builder.add_variable(null, null_node);
        builder.build()
    }

    /// A single `List` edge from `head`'s node to the null node.
    pub fn abstract_list(&mut self, head: &str) -> HeapConfiguration {
        let head = self.symbols.variable(head);
        let null = self.symbols.null_name();
        let null_type = self.symbols.null_type();
        let mut builder = HeapConfiguration::new().builder();
        let first = builder.add_node(self.node);
        let null_node = builder.add_node(null_type);
        builder.add_edge(self.list, &[first, null_node]).expect("rank 2");
        builder.add_variable(head, first);
        builder.add_variable(null, null_node);
        builder.build()
    }

    pub fn variable(&mut self, name: &str) -> Name {
        self.symbols.variable(name)
    }
}
