//! Graph data model shared by the merge engine, codecs and exporters.

pub mod builder;
pub mod correspondence;
pub mod doc;
pub mod graph;

pub use correspondence::Correspondence;
pub use graph::{Graph, Node, TensorInfo, Value, ValueId};
