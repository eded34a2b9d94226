//! Canonicalization: topological order, dead-node elimination and the
//! chain-head input rename.

use crate::{
    errors::CycleError,
    model::graph::{Graph, ValueId},
};
use petgraph::{
    Direction::{Incoming, Outgoing},
    algo::tarjan_scc,
    graph::NodeIndex,
};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, warn};

/// Options for the full canonicalization pass.
#[derive(Debug, Clone, Default)]
pub struct CanonicalizeOptions {
    /// Prefix (separator included) to strip from the only surviving graph input.
    pub head_prefix: Option<String>,
}

/// Full canonicalization with default options (no input rename).
pub fn canonicalize(graph: Graph) -> Result<Graph, CycleError> {
    canonicalize_with(graph, &CanonicalizeOptions::default())
}

/// Topologically order nodes, drop everything not reachable backward from a
/// declared output, compact the arena, then apply the chain-head rename.
pub fn canonicalize_with(mut graph: Graph, opts: &CanonicalizeOptions) -> Result<Graph, CycleError> {
    let order = topological_order(&graph)?;
    graph.reorder_nodes(&order);

    let removed = eliminate_dead(&mut graph);
    let dropped_values = graph.compact();
    debug!(removed_nodes = removed, dropped_values, "canonicalize: dead code removed");

    if let Some(prefix) = opts.head_prefix.as_deref() {
        strip_head_prefix(&mut graph, prefix);
    }
    Ok(graph)
}

/// Per-step normalization between pairwise merges: only sweeps arena values
/// nothing references any more. Ordering and dead-node removal wait for the
/// final pass, since a later correspondence may still name an internal value.
pub fn canonicalize_partial(mut graph: Graph) -> Graph {
    graph.compact();
    graph
}

/// Node positions in dependency order. Among ready nodes the one with the
/// lowest current position goes first, so already-ordered graphs are unchanged.
pub fn topological_order(graph: &Graph) -> Result<Vec<usize>, CycleError> {
    let dep = graph.dependency_graph();
    let mut indegree: Vec<usize> = dep
        .node_indices()
        .map(|n| dep.neighbors_directed(n, Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(pos, _)| Reverse(pos))
        .collect();

    let mut order = Vec::with_capacity(indegree.len());
    while let Some(Reverse(pos)) = ready.pop() {
        order.push(pos);
        for succ in dep.neighbors_directed(NodeIndex::new(pos), Outgoing) {
            let d = &mut indegree[succ.index()];
            *d -= 1;
            if *d == 0 {
                ready.push(Reverse(succ.index()));
            }
        }
    }

    if order.len() == indegree.len() {
        return Ok(order);
    }

    let mut on_cycle: Vec<usize> = tarjan_scc(&dep)
        .into_iter()
        .filter(|scc| scc.len() > 1 || dep.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|n| n.index())
        .collect();
    on_cycle.sort_unstable();
    Err(CycleError {
        members: on_cycle
            .into_iter()
            .map(|pos| display_name(graph, pos))
            .collect(),
    })
}

/// Remove nodes and graph inputs not reachable backward from any declared
/// output. Returns the number of nodes removed.
pub fn eliminate_dead(graph: &mut Graph) -> usize {
    let producers = graph.producers();
    let mut live: HashSet<ValueId> = HashSet::new();
    let mut live_nodes = vec![false; graph.nodes().len()];

    let mut worklist: Vec<ValueId> = graph.outputs().to_vec();
    while let Some(value) = worklist.pop() {
        if !live.insert(value) {
            continue;
        }
        let Some(&pos) = producers.get(&value) else {
            continue;
        };
        if !live_nodes[pos] {
            live_nodes[pos] = true;
            worklist.extend(graph.nodes()[pos].inputs.iter().copied());
        }
    }

    let before = graph.nodes().len();
    graph.retain_nodes(|pos, _| live_nodes[pos]);
    graph.retain_inputs(|id| live.contains(id));
    before - graph.nodes().len()
}

/// Rename the single remaining graph input from `prefix<name>` to `<name>`.
/// Returns whether the rename happened.
pub fn strip_head_prefix(graph: &mut Graph, prefix: &str) -> bool {
    let &[only] = graph.inputs() else {
        return false;
    };
    let Some(stripped) = graph.name_of(only).strip_prefix(prefix) else {
        return false;
    };
    let stripped = stripped.to_string();

    let taken = stripped.is_empty()
        || graph.find_value(&stripped).is_some()
        || graph.nodes().iter().any(|n| n.name == stripped);
    if taken {
        warn!(
            input = graph.name_of(only),
            wanted = %stripped,
            "canonicalize: unprefixed input name is taken, keeping prefix"
        );
        return false;
    }

    debug!(from = graph.name_of(only), to = %stripped, "canonicalize: stripped head prefix");
    graph.value_mut(only).name = stripped;
    true
}

fn display_name(graph: &Graph, pos: usize) -> String {
    let node = &graph.nodes()[pos];
    if node.name.is_empty() {
        format!("<{} #{}>", node.op_type, pos)
    } else {
        node.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::correspondence::Correspondence;
    use crate::merge::splice::splice;

    #[test]
    fn orders_nodes_by_dependency_keeping_ties_stable() {
        let g = Graph::builder("g")
            .input("x")
            .node("late", "Add", &["a_out", "b_out"], &["y"])
            .node("b", "Neg", &["x"], &["b_out"])
            .node("a", "Relu", &["x"], &["a_out"])
            .output("y")
            .build()
            .unwrap();
        let g = canonicalize(g).unwrap();
        assert_eq!(g.node_names(), vec!["b", "a", "late"]);
    }

    #[test]
    fn already_sorted_graph_is_unchanged() {
        let g = Graph::builder("g")
            .input("x")
            .node("a", "Relu", &["x"], &["a_out"])
            .node("b", "Neg", &["x"], &["b_out"])
            .node("c", "Add", &["a_out", "b_out"], &["y"])
            .output("y")
            .build()
            .unwrap();
        let canon = canonicalize(g.clone()).unwrap();
        assert_eq!(canon, g);
    }

    #[test]
    fn feedback_splice_is_cycle_error() {
        let left = Graph::builder("l")
            .input("l_in")
            .node("l_A", "Relu", &["l_in"], &["l_out"])
            .output("l_out")
            .build()
            .unwrap();
        let right = Graph::builder("r")
            .input("r_in")
            .node("r_B", "Neg", &["r_in"], &["r_out"])
            .output("r_out")
            .build()
            .unwrap();
        let spliced = splice(
            left,
            right,
            &[
                Correspondence::new("l_out", "r_in"),
                Correspondence::new("r_out", "l_in"),
            ],
        )
        .unwrap();
        let err = canonicalize(spliced).unwrap_err();
        assert_eq!(err.members, vec!["l_A".to_string(), "r_B".to_string()]);
    }

    #[test]
    fn self_loop_is_cycle_error() {
        let mut g = Graph::builder("g")
            .input("x")
            .node("n", "Add", &["x", "x"], &["y"])
            .output("y")
            .build()
            .unwrap();
        let y = g.find_value("y").unwrap();
        g.nodes_mut()[0].inputs[1] = y;
        let err = topological_order(&g).unwrap_err();
        assert_eq!(err.members, vec!["n".to_string()]);
    }

    #[test]
    fn drops_nodes_and_inputs_unreachable_from_outputs() {
        let g = Graph::builder("g")
            .input("x")
            .input("side")
            .node("keep", "Relu", &["x"], &["y"])
            .node("dead", "Neg", &["side"], &["dead_out"])
            .output("y")
            .build()
            .unwrap();
        let g = canonicalize(g).unwrap();
        assert_eq!(g.node_names(), vec!["keep"]);
        assert_eq!(g.input_names(), vec!["x"]);
        assert!(g.find_value("dead_out").is_none());
        g.validate().unwrap();
    }

    #[test]
    fn strips_prefix_of_single_head_input() {
        let g = Graph::builder("g")
            .input("g1_image")
            .node("g1_conv", "Conv", &["g1_image"], &["g1_feat"])
            .output("g1_feat")
            .build()
            .unwrap();
        let opts = CanonicalizeOptions {
            head_prefix: Some("g1_".into()),
        };
        let g = canonicalize_with(g, &opts).unwrap();
        assert_eq!(g.input_names(), vec!["image"]);
        assert_eq!(g.name_of(g.nodes()[0].inputs[0]), "image");
        assert_eq!(g.output_names(), vec!["g1_feat"]);
    }

    #[test]
    fn keeps_prefix_with_several_inputs_or_on_clash() {
        let two = Graph::builder("g")
            .input("g1_a")
            .input("g1_b")
            .node("g1_add", "Add", &["g1_a", "g1_b"], &["g1_y"])
            .output("g1_y")
            .build()
            .unwrap();
        let mut two = canonicalize(two).unwrap();
        assert!(!strip_head_prefix(&mut two, "g1_"));

        let mut clash = Graph::builder("g")
            .input("g1_x")
            .node("x", "Relu", &["g1_x"], &["g1_y"])
            .output("g1_y")
            .build()
            .unwrap();
        assert!(!strip_head_prefix(&mut clash, "g1_"));
        assert_eq!(clash.input_names(), vec!["g1_x"]);
    }
}
