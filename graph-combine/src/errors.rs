//! Unified error types for the crate.
//!
//! Every fatal condition of a combine invocation maps onto one [`MergeError`]
//! variant. Simplification failures have their own type ([`crate::simplify::SimplifyError`])
//! because the pipeline downgrades them to warnings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MergeError>;

/// Which side of a correspondence failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The producing side (`src`).
    Source,
    /// The consuming side (`dst`).
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => f.write_str("source"),
            Endpoint::Destination => f.write_str("destination"),
        }
    }
}

/// A correspondence names an identifier that is absent from the working graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint} identifier `{identifier}` not found in the working graph")]
pub struct ResolutionError {
    pub identifier: String,
    pub endpoint: Endpoint,
}

impl ResolutionError {
    pub fn missing_source(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            endpoint: Endpoint::Source,
        }
    }

    pub fn missing_destination(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            endpoint: Endpoint::Destination,
        }
    }
}

/// No linear order exists; `members` lists the identifiers that form the loop(s).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("graph contains a cycle through: {}", .members.join(", "))]
pub struct CycleError {
    pub members: Vec<String>,
}

/// Top-level error for combine operations.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Count mismatches, duplicate prefixes, malformed correspondence lists.
    #[error("argument error: {0}")]
    Argument(String),

    /// A graph source is missing, not a regular file, or has the wrong extension.
    #[error("input not found: {}: {reason}", .path.display())]
    InputNotFound { path: PathBuf, reason: String },

    /// A graph decoded fine but breaks a structural invariant.
    #[error("invalid graph `{graph}`: {reason}")]
    InvalidGraph { graph: String, reason: String },

    /// Identifiers that would be ambiguous after merging, with occurrence counts.
    #[error("duplicate identifiers across merged graphs: {}; choose disjoint prefixes", format_counts(.0))]
    Collision(BTreeMap<String, usize>),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// Both operands import the same operator domain at different versions.
    #[error("opset mismatch for domain `{domain}`: {left} vs {right}")]
    OpsetMismatch { domain: String, left: i64, right: i64 },

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(#[from] anyhow::Error),

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl MergeError {
    pub(crate) fn invalid(graph: &str, reason: impl Into<String>) -> Self {
        MergeError::InvalidGraph {
            graph: graph.to_string(),
            reason: reason.into(),
        }
    }
}

fn format_counts(counts: &BTreeMap<String, usize>) -> String {
    counts
        .iter()
        .map(|(name, n)| format!("`{name}` x{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_message_lists_counts() {
        let mut counts = BTreeMap::new();
        counts.insert("conv1".to_string(), 2);
        let msg = MergeError::Collision(counts).to_string();
        assert!(msg.contains("`conv1` x2"), "{msg}");
        assert!(msg.contains("disjoint prefixes"));
    }

    #[test]
    fn resolution_message_names_identifier() {
        let err: MergeError = ResolutionError::missing_destination("g2_Z_in").into();
        assert_eq!(
            err.to_string(),
            "destination identifier `g2_Z_in` not found in the working graph"
        );
    }
}
