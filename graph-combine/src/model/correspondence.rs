//! Output-to-input splice declarations.

use crate::errors::{MergeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One edge to create when joining two graphs: consumers of `dst` will read `src`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Correspondence {
    pub src: String,
    pub dst: String,
}

impl Correspondence {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }

    /// Pair up a flat `src dst src dst ...` sequence as given on the command line.
    pub fn pairs_from_flat<S: AsRef<str>>(flat: &[S]) -> Result<Vec<Correspondence>> {
        if flat.len() % 2 != 0 {
            return Err(MergeError::Argument(format!(
                "correspondence list must alternate source and destination, got {} identifiers",
                flat.len()
            )));
        }
        Ok(flat
            .chunks_exact(2)
            .map(|pair| Correspondence::new(pair[0].as_ref(), pair[1].as_ref()))
            .collect())
    }
}

impl Display for Correspondence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_alternate() {
        let pairs = Correspondence::pairs_from_flat(&["a_out", "b_in", "c_out", "d_in"]).unwrap();
        assert_eq!(
            pairs,
            vec![
                Correspondence::new("a_out", "b_in"),
                Correspondence::new("c_out", "d_in")
            ]
        );
    }

    #[test]
    fn odd_length_is_argument_error() {
        let err = Correspondence::pairs_from_flat(&["a_out", "b_in", "dangling"]).unwrap_err();
        assert!(matches!(err, MergeError::Argument(_)));
    }
}
