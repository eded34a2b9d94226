//! Collision detection between two graphs about to be merged.

use crate::errors::{MergeError, Result};
use crate::model::graph::{Graph, ValueId};
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// `true` if any item occurs more than once.
pub fn has_duplicates<T, I>(items: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash,
{
    let mut seen = HashSet::new();
    items.into_iter().any(|item| !seen.insert(item))
}

/// Every item occurring more than once, with its total count.
pub fn duplicates<'a, I>(items: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(k, n)| (k.to_string(), n))
        .collect()
}

/// Externally visible identifiers of one graph.
///
/// Node names, plus the names of every value that is a graph input, a graph
/// output or a node output. A value counts once however many of those lists
/// hold it, so a pass-through input that is also an output is not a
/// duplicate. Empty names are skipped.
pub fn identifiers(graph: &Graph) -> Vec<&str> {
    let mut ids: Vec<&str> = graph.node_names();
    let mut seen: HashSet<ValueId> = HashSet::new();
    let declared = graph.inputs().iter().chain(graph.outputs());
    let produced = graph.nodes().iter().flat_map(|n| n.outputs.iter());
    for &id in declared.chain(produced) {
        if seen.insert(id) {
            ids.push(graph.name_of(id));
        }
    }
    ids.retain(|s| !s.is_empty());
    ids
}

/// Identifiers occurring more than once across both operands, with counts.
pub fn detect_collisions(left: &Graph, right: &Graph) -> BTreeMap<String, usize> {
    duplicates(identifiers(left).into_iter().chain(identifiers(right)))
}

/// Fail with [`MergeError::Collision`] unless the two operands are disjoint.
pub fn ensure_disjoint(left: &Graph, right: &Graph) -> Result<()> {
    let collisions = detect_collisions(left, right);
    if collisions.is_empty() {
        Ok(())
    } else {
        Err(MergeError::Collision(collisions))
    }
}
