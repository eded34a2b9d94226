//! Best-effort structural simplification of the final graph.
//!
//! The pipeline calls a [`Simplifier`] once, after the chain merge. A failure
//! is data, not a fatal error: the caller logs it and keeps the graph it had.

use crate::model::graph::{Graph, ValueId};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SimplifyError {
    /// The rewritten graph broke a structural invariant.
    #[error("simplified graph is invalid: {0}")]
    Invalid(String),

    #[error("{0}")]
    Other(String),
}

pub trait Simplifier {
    fn name(&self) -> &'static str;

    fn simplify(&self, graph: &Graph) -> Result<Graph, SimplifyError>;
}

/// Returns the graph unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSimplifier;

impl Simplifier for NoopSimplifier {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn simplify(&self, graph: &Graph) -> Result<Graph, SimplifyError> {
        Ok(graph.clone())
    }
}

/// Removes `Identity` nodes by pointing their consumers at the identity's input.
///
/// Identities producing a declared graph output are kept so output names stay
/// stable. Splicing often leaves such nodes behind at graph seams.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityElimination;

impl IdentityElimination {
    const OP: &'static str = "Identity";
}

impl Simplifier for IdentityElimination {
    fn name(&self) -> &'static str {
        "identity_elimination"
    }

    fn simplify(&self, graph: &Graph) -> Result<Graph, SimplifyError> {
        let mut out = graph.clone();

        let mut forward: HashMap<ValueId, ValueId> = HashMap::new();
        let mut drop = vec![false; out.nodes().len()];
        for (pos, node) in out.nodes().iter().enumerate() {
            if node.op_type != Self::OP {
                continue;
            }
            let ([input], [output]) = (node.inputs.as_slice(), node.outputs.as_slice()) else {
                continue;
            };
            if out.is_output(*output) {
                continue;
            }
            forward.insert(*output, *input);
            drop[pos] = true;
        }
        if forward.is_empty() {
            return Ok(out);
        }

        // Identity chains collapse to their first non-identity source.
        let resolve = |mut id: ValueId| {
            while let Some(&next) = forward.get(&id) {
                id = next;
            }
            id
        };
        let removed = drop.iter().filter(|d| **d).count();
        out.retain_nodes(|pos, _| !drop[pos]);
        for node in out.nodes_mut() {
            for input in node.inputs.iter_mut() {
                *input = resolve(*input);
            }
        }
        out.compact();
        out.validate()
            .map_err(|e| SimplifyError::Invalid(e.to_string()))?;

        debug!(removed, "simplify: identity nodes removed");
        Ok(out)
    }
}
