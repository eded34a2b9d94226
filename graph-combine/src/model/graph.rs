//! Arena-backed computation graph.
//!
//! Values live in a single arena and are addressed by [`ValueId`]. Nodes and the
//! graph-level input/output lists only hold ids, so rewiring an edge is an id
//! reassignment and renaming a value renames every reference to it at once.
//!
//! The arena may accumulate values that nothing references any more (after a
//! splice or a prune); [`Graph::compact`] drops them and renumbers the rest.

use crate::errors::{MergeError, Result};
use crate::merge::collision::duplicates;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Stable index of a [`Value`] inside one graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u32);

impl ValueId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        ValueId(index as u32)
    }
}

/// Tensor metadata carried through the merge untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TensorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elem_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<serde_json::Value>>,
}

impl TensorInfo {
    pub fn is_empty(&self) -> bool {
        self.elem_type.is_none() && self.shape.is_none()
    }
}

/// A named tensor slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub name: String,
    pub info: TensorInfo,
}

/// An operator instance. `op_type` and `attributes` are opaque to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub op_type: String,
    pub inputs: Vec<ValueId>,
    pub outputs: Vec<ValueId>,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub name: String,
    /// Operator domain -> opset version.
    pub opset_import: BTreeMap<String, i64>,
    values: Vec<Value>,
    nodes: Vec<Node>,
    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn builder(name: impl Into<String>) -> crate::model::builder::GraphBuilder {
        crate::model::builder::GraphBuilder::new(name)
    }

    // --- arena ---

    pub fn add_value(&mut self, name: impl Into<String>, info: TensorInfo) -> ValueId {
        let id = ValueId::from_index(self.values.len());
        self.values.push(Value {
            name: name.into(),
            info,
        });
        id
    }

    #[inline]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    #[inline]
    pub fn value_mut(&mut self, id: ValueId) -> &mut Value {
        &mut self.values[id.index()]
    }

    #[inline]
    pub fn name_of(&self, id: ValueId) -> &str {
        &self.values[id.index()].name
    }

    pub fn values(&self) -> impl Iterator<Item = (ValueId, &Value)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (ValueId::from_index(i), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.values.iter_mut()
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// First value carrying `name`, if any.
    pub fn find_value(&self, name: &str) -> Option<ValueId> {
        self.values
            .iter()
            .position(|v| v.name == name)
            .map(ValueId::from_index)
    }

    /// Name -> id lookup table. On duplicate names the first value wins.
    pub fn value_index(&self) -> HashMap<&str, ValueId> {
        let mut index = HashMap::with_capacity(self.values.len());
        for (id, v) in self.values() {
            index.entry(v.name.as_str()).or_insert(id);
        }
        index
    }

    // --- nodes & declarations ---

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    pub fn push_input(&mut self, id: ValueId) {
        self.inputs.push(id);
    }

    pub fn push_output(&mut self, id: ValueId) {
        self.outputs.push(id);
    }

    pub fn retain_inputs(&mut self, keep: impl FnMut(&ValueId) -> bool) {
        self.inputs.retain(keep);
    }

    pub fn retain_outputs(&mut self, keep: impl FnMut(&ValueId) -> bool) {
        self.outputs.retain(keep);
    }

    /// Keep only the nodes whose position satisfies `keep`, preserving order.
    pub fn retain_nodes(&mut self, mut keep: impl FnMut(usize, &Node) -> bool) {
        let mut pos = 0usize;
        self.nodes.retain(|n| {
            let k = keep(pos, n);
            pos += 1;
            k
        });
    }

    /// Rearrange nodes so that `order[k]` (an old position) lands at position `k`.
    pub fn reorder_nodes(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.nodes.len());
        let mut slots: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        self.nodes = order.iter().filter_map(|&i| slots[i].take()).collect();
    }

    pub fn is_input(&self, id: ValueId) -> bool {
        self.inputs.contains(&id)
    }

    pub fn is_output(&self, id: ValueId) -> bool {
        self.outputs.contains(&id)
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|&id| self.name_of(id)).collect()
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|&id| self.name_of(id)).collect()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Value -> position of the node producing it.
    pub fn producers(&self) -> HashMap<ValueId, usize> {
        let mut map = HashMap::new();
        for (pos, node) in self.nodes.iter().enumerate() {
            for &out in &node.outputs {
                map.insert(out, pos);
            }
        }
        map
    }

    /// Every value read by at least one node.
    pub fn consumed_values(&self) -> HashSet<ValueId> {
        self.nodes
            .iter()
            .flat_map(|n| n.inputs.iter().copied())
            .collect()
    }

    // --- structural edits ---

    /// Move every value, node and declaration of `other` into `self`.
    ///
    /// `other`'s ids are shifted past the end of this arena so the two sides stay
    /// disjoint; no edge is created between them.
    pub fn absorb(&mut self, other: Graph) -> Result<()> {
        for (domain, &version) in &other.opset_import {
            match self.opset_import.get(domain) {
                Some(&mine) if mine != version => {
                    return Err(MergeError::OpsetMismatch {
                        domain: domain.clone(),
                        left: mine,
                        right: version,
                    });
                }
                Some(_) => {}
                None => {
                    self.opset_import.insert(domain.clone(), version);
                }
            }
        }

        let offset = self.values.len();
        let shift = |id: ValueId| ValueId::from_index(id.index() + offset);

        self.values.extend(other.values);
        self.inputs.extend(other.inputs.into_iter().map(shift));
        self.outputs.extend(other.outputs.into_iter().map(shift));
        for mut node in other.nodes {
            node.inputs.iter_mut().for_each(|id| *id = shift(*id));
            node.outputs.iter_mut().for_each(|id| *id = shift(*id));
            self.nodes.push(node);
        }
        Ok(())
    }

    /// Drop arena values that no node or declaration references; renumber the rest.
    /// Returns the number of values dropped.
    pub fn compact(&mut self) -> usize {
        let mut live = vec![false; self.values.len()];
        let ids = self
            .inputs
            .iter()
            .chain(self.outputs.iter())
            .chain(self.nodes.iter().flat_map(|n| n.inputs.iter().chain(&n.outputs)));
        for id in ids {
            live[id.index()] = true;
        }

        let mut remap: Vec<Option<ValueId>> = vec![None; self.values.len()];
        let mut kept = Vec::with_capacity(self.values.len());
        for (i, value) in std::mem::take(&mut self.values).into_iter().enumerate() {
            if live[i] {
                remap[i] = Some(ValueId::from_index(kept.len()));
                kept.push(value);
            }
        }
        let dropped = remap.len() - kept.len();
        self.values = kept;

        // Every id below was marked live above, so the lookup cannot miss.
        let fix = |id: &mut ValueId| {
            if let Some(new) = remap[id.index()] {
                *id = new;
            }
        };
        self.inputs.iter_mut().for_each(fix);
        self.outputs.iter_mut().for_each(fix);
        for node in &mut self.nodes {
            node.inputs.iter_mut().for_each(fix);
            node.outputs.iter_mut().for_each(fix);
        }
        dropped
    }

    /// Data-dependency graph: one vertex per node (weight = position), one edge
    /// per consumed node output, labelled with the value that flows.
    pub fn dependency_graph(&self) -> DiGraph<usize, ValueId> {
        let mut dep: DiGraph<usize, ValueId> = DiGraph::with_capacity(self.nodes.len(), 0);
        for pos in 0..self.nodes.len() {
            dep.add_node(pos);
        }
        let producers = self.producers();
        for (pos, node) in self.nodes.iter().enumerate() {
            for &input in &node.inputs {
                if let Some(&src) = producers.get(&input) {
                    dep.add_edge(NodeIndex::new(src), NodeIndex::new(pos), input);
                }
            }
        }
        dep
    }

    /// Check the structural invariants every graph must satisfy:
    /// single producer per value, no node writing a graph input, no dangling
    /// node input or graph output, unique value names and unique non-empty
    /// node names.
    pub fn validate(&self) -> Result<()> {
        let inputs: HashSet<ValueId> = self.inputs.iter().copied().collect();
        let mut produced: HashMap<ValueId, &str> = HashMap::new();

        for node in &self.nodes {
            for &out in &node.outputs {
                if inputs.contains(&out) {
                    return Err(MergeError::invalid(
                        &self.name,
                        format!(
                            "node `{}` overwrites graph input `{}`",
                            node.name,
                            self.name_of(out)
                        ),
                    ));
                }
                if let Some(first) = produced.insert(out, &node.name) {
                    return Err(MergeError::invalid(
                        &self.name,
                        format!(
                            "value `{}` is produced by both `{}` and `{}`",
                            self.name_of(out),
                            first,
                            node.name
                        ),
                    ));
                }
            }
        }

        for node in &self.nodes {
            for &input in &node.inputs {
                if !inputs.contains(&input) && !produced.contains_key(&input) {
                    return Err(MergeError::invalid(
                        &self.name,
                        format!(
                            "node `{}` reads undefined value `{}`",
                            node.name,
                            self.name_of(input)
                        ),
                    ));
                }
            }
        }

        for &out in &self.outputs {
            if !inputs.contains(&out) && !produced.contains_key(&out) {
                return Err(MergeError::invalid(
                    &self.name,
                    format!("graph output `{}` has no producer", self.name_of(out)),
                ));
            }
        }

        let dup_values = duplicates(
            self.values
                .iter()
                .map(|v| v.name.as_str())
                .filter(|n| !n.is_empty()),
        );
        if let Some(name) = dup_values.keys().next() {
            return Err(MergeError::invalid(
                &self.name,
                format!("value name `{name}` is used by more than one value"),
            ));
        }

        let dup_nodes = duplicates(
            self.nodes
                .iter()
                .map(|n| n.name.as_str())
                .filter(|n| !n.is_empty()),
        );
        if let Some(name) = dup_nodes.keys().next() {
            return Err(MergeError::invalid(
                &self.name,
                format!("node name `{name}` is not unique"),
            ));
        }

        Ok(())
    }
}
