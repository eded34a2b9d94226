//! Run summary: what was written and how big the combined graph is.
//!
//! Returned by [`crate::run::combine_networks`] and optionally written as
//! pretty JSON. Keep field names stable; they are grepped downstream.

use crate::{errors::Result, model::graph::Graph};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineSummary {
    /// ISO 8601 UTC timestamp when the summary was produced.
    pub generated_at: String,
    pub output_path: String,
    pub intermediate_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphml_path: Option<String>,
    /// Number of pairwise merge steps performed.
    pub steps: usize,
    pub nodes: usize,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Node count per operator type.
    pub ops: BTreeMap<String, usize>,
    /// `Some(true)` if the simplifier ran and succeeded, `None` if disabled.
    pub simplified: Option<bool>,
    pub nodes_removed_by_simplifier: usize,
}

impl CombineSummary {
    pub fn from_graph(graph: &Graph, output_path: &Path, steps: usize) -> Self {
        let mut ops: BTreeMap<String, usize> = BTreeMap::new();
        for node in graph.nodes() {
            *ops.entry(node.op_type.clone()).or_insert(0) += 1;
        }
        Self {
            generated_at: Utc::now().to_rfc3339(),
            output_path: output_path.to_string_lossy().into_owned(),
            intermediate_paths: Vec::new(),
            graphml_path: None,
            steps,
            nodes: graph.nodes().len(),
            inputs: graph.input_names().into_iter().map(String::from).collect(),
            outputs: graph.output_names().into_iter().map(String::from).collect(),
            ops,
            simplified: None,
            nodes_removed_by_simplifier: 0,
        }
    }
}

pub fn write_summary(path: &Path, summary: &CombineSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let f = fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, summary)?;
    w.write_all(b"\n")?;
    w.flush()?;
    info!("summary: wrote -> {}", path.display());
    Ok(())
}
