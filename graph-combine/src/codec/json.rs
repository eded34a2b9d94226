//! JSON graph documents (`.json`), see [`crate::model::doc::GraphDoc`].

use crate::{
    codec::{GraphCodec, check_graph_source},
    errors::Result,
    model::{doc::GraphDoc, graph::Graph},
};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGraphCodec;

impl GraphCodec for JsonGraphCodec {
    fn extension(&self) -> &str {
        "json"
    }

    fn load(&self, path: &Path) -> Result<Graph> {
        check_graph_source(path, self.extension())?;
        let reader = BufReader::new(File::open(path)?);
        let mut doc: GraphDoc = serde_json::from_reader(reader)?;
        if doc.name.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                doc.name = stem.to_string();
            }
        }
        let graph = Graph::try_from(doc)?;
        debug!(
            path = %path.display(),
            nodes = graph.nodes().len(),
            inputs = graph.inputs().len(),
            outputs = graph.outputs().len(),
            "json: graph loaded"
        );
        Ok(graph)
    }

    fn save(&self, graph: &Graph, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, &GraphDoc::from(graph))?;
        w.write_all(b"\n")?;
        w.flush()?;
        info!("json: wrote graph -> {}", path.display());
        Ok(())
    }
}
