//! Edge splicing: join two graphs by redirecting consumers of a destination
//! value to a source value.
//!
//! All correspondences of a step are validated against the naive union before
//! any reference is rewritten, so a step either applies completely or fails
//! without touching the operands' structure.

use crate::{
    errors::{ResolutionError, Result},
    model::{correspondence::Correspondence, graph::Graph, graph::ValueId},
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Union `left` and `right`, then apply every correspondence in list order.
///
/// For each `(src, dst)`:
/// - `src` must be a graph input or a node output of the union;
/// - `dst` must be read by at least one node;
/// - every node input currently reading `dst` is redirected to `src`;
/// - `dst` loses its graph-input declaration once nothing reads it;
/// - if `src` is a node output it is removed from the declared outputs.
///
/// When several correspondences share a `dst`, the last one wins.
pub fn splice(left: Graph, right: Graph, correspondences: &[Correspondence]) -> Result<Graph> {
    let mut merged = left;
    merged.absorb(right)?;

    let (remap, spliced_sources) = resolve(&merged, correspondences)?;
    if remap.is_empty() {
        return Ok(merged);
    }

    for node in merged.nodes_mut() {
        for input in node.inputs.iter_mut() {
            if let Some(&src) = remap.get(input) {
                *input = src;
            }
        }
    }

    let still_read = merged.consumed_values();
    let outputs: HashSet<ValueId> = merged.outputs().iter().copied().collect();
    merged.retain_inputs(|id| {
        !remap.contains_key(id) || still_read.contains(id) || outputs.contains(id)
    });

    let producers = merged.producers();
    merged.retain_outputs(|id| !(spliced_sources.contains(id) && producers.contains_key(id)));

    debug!(
        spliced = remap.len(),
        nodes = merged.nodes().len(),
        inputs = merged.inputs().len(),
        outputs = merged.outputs().len(),
        "splice: applied"
    );
    Ok(merged)
}

/// Validate both ends of every correspondence, then fold them into one
/// `original reference -> final source` table.
///
/// Folding in list order keeps sequential semantics: `(src, dst)` first sends
/// every reference already redirected to `dst` on to `src`, then maps `dst`
/// itself. Applying the table once is then the same as rewriting the graph
/// after each correspondence.
fn resolve(
    graph: &Graph,
    correspondences: &[Correspondence],
) -> Result<(HashMap<ValueId, ValueId>, HashSet<ValueId>)> {
    let index = graph.value_index();
    let producers = graph.producers();
    let consumed = graph.consumed_values();

    let mut remap: HashMap<ValueId, ValueId> = HashMap::new();
    let mut sources: HashSet<ValueId> = HashSet::new();

    for c in correspondences {
        let src = index
            .get(c.src.as_str())
            .copied()
            .filter(|id| graph.is_input(*id) || producers.contains_key(id))
            .ok_or_else(|| ResolutionError::missing_source(&c.src))?;
        let dst = index
            .get(c.dst.as_str())
            .copied()
            .filter(|id| consumed.contains(id))
            .ok_or_else(|| ResolutionError::missing_destination(&c.dst))?;

        if src == dst {
            warn!(correspondence = %c, "splice: source equals destination, skipping");
            continue;
        }

        for target in remap.values_mut() {
            if *target == dst {
                *target = src;
            }
        }
        if let Some(previous) = remap.insert(dst, src) {
            if previous != dst {
                warn!(
                    dst = %c.dst,
                    previous = graph.name_of(previous),
                    now = %c.src,
                    "splice: destination spliced twice, last correspondence wins"
                );
            }
        }
        sources.insert(src);
    }

    remap.retain(|from, to| from != to);
    Ok((remap, sources))
}
