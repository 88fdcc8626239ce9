use std::fmt;

use super::HeapConfiguration;
use crate::SymbolTable;

impl HeapConfiguration {
    /// Render the heap in a line-oriented text form, ordered by id.
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> impl fmt::Display + 'a {
        DisplayHeap { heap: self, symbols }
    }
}

struct DisplayHeap<'a> {
    heap: &'a HeapConfiguration,
    symbols: &'a SymbolTable,
}

impl fmt::Display for DisplayHeap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (heap, symbols) = (self.heap, self.symbols);
        let nodes: Vec<String> = heap
            .nodes()
            .map(|n| format!("{}:{}", n.raw(), symbols.type_name(heap.node_type(n))))
            .collect();
        writeln!(f, "nodes [{}]", nodes.join(", "))?;
        let externals: Vec<String> = heap.externals().iter().map(|n| n.raw().to_string()).collect();
        writeln!(f, "externals [{}]", externals.join(", "))?;
        for node in heap.nodes() {
            for (selector, target) in heap.selectors(node) {
                writeln!(
                    f,
                    "{}.{} -> {}",
                    node.raw(),
                    symbols.selector_name(*selector),
                    target.raw()
                )?;
            }
        }
        for edge in heap.edges() {
            let attached: Vec<String> = heap
                .attached_nodes(edge)
                .iter()
                .map(|n| n.raw().to_string())
                .collect();
            writeln!(
                f,
                "{}({})",
                heap.label_of(edge).display(symbols),
                attached.join(", ")
            )?;
        }
        for variable in heap.variables() {
            writeln!(
                f,
                "{} -> {}",
                symbols.variable_name(heap.name_of(variable)),
                heap.target_of(variable).raw()
            )?;
        }
        Ok(())
    }
}
