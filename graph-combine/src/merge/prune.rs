//! Remove graph inputs nothing reads any more.

use crate::model::graph::Graph;
use tracing::debug;

/// Drop every declared graph input that no node reads.
///
/// An input that is also declared as a graph output (a pass-through) is kept,
/// since removing it would leave that output without a definition.
pub fn prune_unused_inputs(mut graph: Graph) -> Graph {
    let read = graph.consumed_values();
    let outputs = graph.outputs().to_vec();
    let before = graph.inputs().len();
    graph.retain_inputs(|id| read.contains(id) || outputs.contains(id));
    let removed = before - graph.inputs().len();
    if removed > 0 {
        debug!(removed, "prune: dropped unused graph inputs");
    }
    graph
}
