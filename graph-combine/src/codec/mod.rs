//! Graph persistence.
//!
//! [`GraphCodec`] is the seam between the engine and the storage format; the
//! pipeline only ever talks to the trait. [`json::JsonGraphCodec`] is the
//! built-in implementation.

pub mod json;

use crate::{
    errors::{MergeError, Result},
    model::graph::Graph,
};
use std::path::Path;

pub use json::JsonGraphCodec;

pub trait GraphCodec {
    /// File extension this codec reads and writes, without the dot.
    fn extension(&self) -> &str;

    fn load(&self, path: &Path) -> Result<Graph>;

    fn save(&self, graph: &Graph, path: &Path) -> Result<()>;
}

/// Check that `path` exists, is a regular file and carries `extension`.
pub fn check_graph_source(path: &Path, extension: &str) -> Result<()> {
    let not_found = |reason: &str| MergeError::InputNotFound {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if !path.exists() {
        return Err(not_found("does not exist"));
    }
    if !path.is_file() {
        return Err(not_found("not a regular file"));
    }
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if !ext_ok {
        return Err(not_found(&format!("expected a .{extension} file")));
    }
    Ok(())
}
