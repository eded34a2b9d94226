//! Fluent construction of validated graphs.

use crate::{
    errors::Result,
    model::{
        doc::{GraphDoc, NodeDoc, ValueDoc},
        graph::{Graph, TensorInfo},
    },
};

/// Collects a [`GraphDoc`] and validates it on [`GraphBuilder::build`].
///
/// ```
/// use graph_combine::model::graph::Graph;
///
/// let g = Graph::builder("head")
///     .input("x")
///     .node("relu", "Relu", &["x"], &["y"])
///     .output("y")
///     .build()
///     .unwrap();
/// assert_eq!(g.nodes().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    doc: GraphDoc,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            doc: GraphDoc {
                name: name.into(),
                ..GraphDoc::default()
            },
        }
    }

    pub fn opset(mut self, domain: &str, version: i64) -> Self {
        self.doc.opset_import.insert(domain.to_string(), version);
        self
    }

    pub fn input(self, name: &str) -> Self {
        self.typed_input(name, TensorInfo::default())
    }

    pub fn typed_input(mut self, name: &str, info: TensorInfo) -> Self {
        self.doc.inputs.push(ValueDoc {
            name: name.to_string(),
            info,
        });
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.doc.outputs.push(ValueDoc {
            name: name.to_string(),
            info: TensorInfo::default(),
        });
        self
    }

    pub fn node(mut self, name: &str, op_type: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        self.doc.nodes.push(NodeDoc {
            name: name.to_string(),
            op_type: op_type.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            attributes: Default::default(),
        });
        self
    }

    /// Attach an attribute to the most recently added node.
    pub fn attribute(mut self, key: &str, value: serde_json::Value) -> Self {
        if let Some(node) = self.doc.nodes.last_mut() {
            node.attributes.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> Result<Graph> {
        Graph::try_from(self.doc)
    }
}
