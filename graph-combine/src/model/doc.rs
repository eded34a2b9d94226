//! On-disk graph document and its conversion to/from the arena [`Graph`].
//!
//! The document is name-based (every reference is a string), which keeps the
//! files readable and diff-friendly:
//!
//! ```json
//! {
//!   "name": "detector",
//!   "opset_import": { "": 13 },
//!   "inputs":  [{ "name": "image", "elem_type": "float32", "shape": [1, 3, 240, 320] }],
//!   "outputs": [{ "name": "boxes" }],
//!   "nodes": [
//!     { "name": "conv1", "op_type": "Conv", "inputs": ["image"], "outputs": ["boxes"] }
//!   ]
//! }
//! ```

use crate::{
    errors::{MergeError, Result},
    model::graph::{Graph, Node, TensorInfo, ValueId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDoc {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub opset_import: BTreeMap<String, i64>,
    #[serde(default)]
    pub inputs: Vec<ValueDoc>,
    #[serde(default)]
    pub outputs: Vec<ValueDoc>,
    #[serde(default)]
    pub nodes: Vec<NodeDoc>,
    /// Metadata for values that are neither graph inputs nor outputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_info: Vec<ValueDoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueDoc {
    pub name: String,
    #[serde(flatten)]
    pub info: TensorInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    #[serde(default)]
    pub name: String,
    pub op_type: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<GraphDoc> for Graph {
    type Error = MergeError;

    fn try_from(doc: GraphDoc) -> Result<Graph> {
        let mut graph = Graph::new(doc.name);
        graph.opset_import = doc.opset_import;
        let gname = graph.name.clone();

        let mut known: HashMap<String, TensorInfo> = HashMap::new();
        for v in doc.value_info.iter().chain(doc.outputs.iter()) {
            if !v.info.is_empty() {
                known.insert(v.name.clone(), v.info.clone());
            }
        }

        let mut by_name: HashMap<String, ValueId> = HashMap::new();

        for input in doc.inputs {
            if by_name.contains_key(&input.name) {
                return Err(MergeError::invalid(
                    &gname,
                    format!("graph input `{}` is declared twice", input.name),
                ));
            }
            let id = graph.add_value(input.name.clone(), input.info);
            by_name.insert(input.name, id);
            graph.push_input(id);
        }

        // Outputs first so nodes may appear in any order on disk.
        for node in &doc.nodes {
            for out in &node.outputs {
                if by_name.contains_key(out) {
                    return Err(MergeError::invalid(
                        &gname,
                        format!("value `{}` written by node `{}` is already defined", out, node.name),
                    ));
                }
                let info = known.get(out).cloned().unwrap_or_default();
                let id = graph.add_value(out.clone(), info);
                by_name.insert(out.clone(), id);
            }
        }

        for node in doc.nodes {
            let resolve = |name: &String| {
                by_name.get(name).copied().ok_or_else(|| {
                    MergeError::invalid(
                        &gname,
                        format!("node `{}` reads undefined value `{}`", node.name, name),
                    )
                })
            };
            let inputs = node.inputs.iter().map(resolve).collect::<Result<Vec<_>>>()?;
            let outputs = node.outputs.iter().map(resolve).collect::<Result<Vec<_>>>()?;
            graph.push_node(Node {
                name: node.name,
                op_type: node.op_type,
                inputs,
                outputs,
                attributes: node.attributes,
            });
        }

        for output in doc.outputs {
            let Some(&id) = by_name.get(&output.name) else {
                return Err(MergeError::invalid(
                    &gname,
                    format!("graph output `{}` has no producer", output.name),
                ));
            };
            if graph.is_output(id) {
                return Err(MergeError::invalid(
                    &gname,
                    format!("graph output `{}` is declared twice", output.name),
                ));
            }
            graph.push_output(id);
        }

        graph.validate()?;
        Ok(graph)
    }
}

impl From<&Graph> for GraphDoc {
    fn from(graph: &Graph) -> Self {
        let value_doc = |id: ValueId| {
            let v = graph.value(id);
            ValueDoc {
                name: v.name.clone(),
                info: v.info.clone(),
            }
        };

        let nodes = graph
            .nodes()
            .iter()
            .map(|n| NodeDoc {
                name: n.name.clone(),
                op_type: n.op_type.clone(),
                inputs: n.inputs.iter().map(|&id| graph.name_of(id).to_string()).collect(),
                outputs: n.outputs.iter().map(|&id| graph.name_of(id).to_string()).collect(),
                attributes: n.attributes.clone(),
            })
            .collect();

        let value_info = graph
            .values()
            .filter(|(id, v)| !v.info.is_empty() && !graph.is_input(*id) && !graph.is_output(*id))
            .map(|(id, _)| value_doc(id))
            .collect();

        GraphDoc {
            name: graph.name.clone(),
            opset_import: graph.opset_import.clone(),
            inputs: graph.inputs().iter().map(|&id| value_doc(id)).collect(),
            outputs: graph.outputs().iter().map(|&id| value_doc(id)).collect(),
            nodes,
            value_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_nodes_listed_out_of_order() {
        let doc: GraphDoc = serde_json::from_value(json!({
            "name": "g",
            "inputs": [{ "name": "x", "elem_type": "float32", "shape": [1, 4] }],
            "outputs": [{ "name": "z" }],
            "nodes": [
                { "name": "b", "op_type": "Relu", "inputs": ["y"], "outputs": ["z"] },
                { "name": "a", "op_type": "Neg", "inputs": ["x"], "outputs": ["y"] }
            ],
            "value_info": [{ "name": "y", "elem_type": "float32" }]
        }))
        .unwrap();

        let graph = Graph::try_from(doc).unwrap();
        assert_eq!(graph.node_names(), vec!["b", "a"]);
        let y = graph.find_value("y").unwrap();
        assert_eq!(graph.value(y).info.elem_type.as_deref(), Some("float32"));
        let x = graph.inputs()[0];
        assert_eq!(graph.value(x).info.shape, Some(vec![json!(1), json!(4)]));
    }

    #[test]
    fn rejects_undefined_reference() {
        let doc: GraphDoc = serde_json::from_value(json!({
            "name": "g",
            "outputs": [{ "name": "y" }],
            "nodes": [{ "name": "a", "op_type": "Neg", "inputs": ["nope"], "outputs": ["y"] }]
        }))
        .unwrap();
        let err = Graph::try_from(doc).unwrap_err();
        assert!(err.to_string().contains("undefined value `nope`"), "{err}");
    }

    #[test]
    fn rejects_double_producer() {
        let doc: GraphDoc = serde_json::from_value(json!({
            "nodes": [
                { "name": "a", "op_type": "Constant", "outputs": ["y"] },
                { "name": "b", "op_type": "Constant", "outputs": ["y"] }
            ]
        }))
        .unwrap();
        assert!(matches!(Graph::try_from(doc), Err(MergeError::InvalidGraph { .. })));
    }

    #[test]
    fn document_survives_conversion_back() {
        let doc: GraphDoc = serde_json::from_value(json!({
            "name": "g",
            "opset_import": { "": 13 },
            "inputs": [{ "name": "x" }],
            "outputs": [{ "name": "y", "elem_type": "float16" }],
            "nodes": [{
                "name": "a", "op_type": "Cast", "inputs": ["x"], "outputs": ["y"],
                "attributes": { "to": 10 }
            }]
        }))
        .unwrap();
        let graph = Graph::try_from(doc.clone()).unwrap();
        assert_eq!(GraphDoc::from(&graph), doc);
    }
}
