//! High-level orchestration: load N graphs, merge them, simplify, persist.
//!
//! The single public entry point is [`combine_networks`]. Graph storage and
//! simplification come in as trait objects so the binary (or a test) decides
//! which implementations run.

use crate::{
    codec::GraphCodec,
    config::model::MergeConfig,
    errors::Result,
    export::{CombineSummary, write_graphml, write_summary},
    merge::chain::{merge_chain, validate_chain_arguments},
    model::{correspondence::Correspondence, graph::Graph},
    simplify::Simplifier,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to combine and where to put the result.
#[derive(Debug, Clone, Default)]
pub struct CombineRequest {
    /// Graph sources, in chain order.
    pub input_paths: Vec<PathBuf>,
    /// One list per consecutive pair of graphs.
    pub correspondences: Vec<Vec<Correspondence>>,
    /// One distinct prefix per graph, or `None` to keep names as they are.
    pub prefixes: Option<Vec<String>>,
    pub output_path: PathBuf,
    /// Also export the final graph as GraphML.
    pub graphml_path: Option<PathBuf>,
}

/// Main pipeline.
///
/// # Steps:
/// 1. **Validate** config and argument counts before touching any file.
/// 2. **Load** every source through `codec`.
/// 3. **Merge** the chain, persisting each intermediate result if configured.
/// 4. **Simplify** the final graph (best effort; failure keeps the merged graph).
/// 5. **Save** the optional GraphML and summary, then the output.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(graphs = request.input_paths.len(), output = %request.output_path.display())
)]
pub fn combine_networks(
    request: &CombineRequest,
    config: &MergeConfig,
    codec: &dyn GraphCodec,
    simplifier: &dyn Simplifier,
) -> Result<CombineSummary> {
    config.validate()?;
    validate_chain_arguments(
        request.input_paths.len(),
        request.prefixes.as_deref(),
        &request.correspondences,
    )?;

    let mut graphs = Vec::with_capacity(request.input_paths.len());
    for (idx, path) in request.input_paths.iter().enumerate() {
        info!("MODEL_INDEX={idx}: {}", path.display());
        graphs.push(codec.load(path)?);
    }

    let mut intermediates: Vec<PathBuf> = Vec::new();
    let merged = merge_chain(
        graphs,
        request.prefixes.as_deref(),
        &request.correspondences,
        &config.chain_options(),
        |step, g: &Graph| {
            if config.persist.output_intermediate {
                let path = intermediate_path(&request.output_path, step + 1, codec.extension());
                codec.save(g, &path)?;
                intermediates.push(path);
            }
            Ok(())
        },
    )?;
    info!(
        nodes = merged.nodes().len(),
        inputs = merged.inputs().len(),
        outputs = merged.outputs().len(),
        "Merged graph canonicalized"
    );

    let (graph, simplified, removed) = if config.simplify.enabled {
        match simplifier.simplify(&merged) {
            Ok(simple) => {
                let removed = merged.nodes().len().saturating_sub(simple.nodes().len());
                info!(simplifier = simplifier.name(), removed, "Simplified merged graph");
                (simple, Some(true), removed)
            }
            Err(err) => {
                warn!(
                    simplifier = simplifier.name(),
                    error = %err,
                    "Simplification failed, keeping the unsimplified graph"
                );
                (merged, Some(false), 0)
            }
        }
    } else {
        (merged, None, 0)
    };

    let mut summary =
        CombineSummary::from_graph(&graph, &request.output_path, request.correspondences.len());
    summary.simplified = simplified;
    summary.nodes_removed_by_simplifier = removed;
    summary.intermediate_paths = intermediates
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    // The output appears only after every side artifact is written.
    if let Some(graphml) = &request.graphml_path {
        write_graphml(graphml, &graph)?;
        summary.graphml_path = Some(graphml.to_string_lossy().into_owned());
    }
    if config.persist.write_summary {
        write_summary(&summary_path(&request.output_path), &summary)?;
    }
    codec.save(&graph, &request.output_path)?;

    info!(output = %request.output_path.display(), "Combined graph saved");
    Ok(summary)
}

/// `dir/merged.json` -> `dir/merged.step2.json`
pub fn intermediate_path(output: &Path, step: usize, extension: &str) -> PathBuf {
    output.with_file_name(format!("{}.step{step}.{extension}", stem(output)))
}

/// `dir/merged.json` -> `dir/merged.summary.json`
pub fn summary_path(output: &Path) -> PathBuf {
    output.with_file_name(format!("{}.summary.json", stem(output)))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "combined".to_string())
}
