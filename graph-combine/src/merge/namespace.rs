//! Identifier namespacing: give every name in a graph a common prefix.

use crate::model::graph::Graph;

/// Prefix every node name and every value name with `prefix + separator`.
///
/// Values are renamed in the arena, so graph inputs, graph outputs, node outputs
/// and all references to them change together. Empty names stay empty, and an
/// empty `prefix` returns the graph untouched. Applying the same non-empty
/// prefix twice prefixes twice.
pub fn namespace(mut graph: Graph, prefix: &str, separator: &str) -> Graph {
    if prefix.is_empty() {
        return graph;
    }
    let head = format!("{prefix}{separator}");
    let prefixed = |name: &mut String| {
        if !name.is_empty() {
            name.insert_str(0, &head);
        }
    };

    for node in graph.nodes_mut() {
        prefixed(&mut node.name);
    }
    for value in graph.values_mut() {
        prefixed(&mut value.name);
    }
    graph
}
