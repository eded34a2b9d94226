//! Combine independently authored inference graphs into one.
//!
//! Each source graph gets its own identifier prefix, the pairs of graphs are
//! checked for name collisions, chosen outputs of an upstream graph are spliced
//! into inputs of the next one, unused inputs are pruned, and the result is put
//! back into topological order with dead nodes removed.
//!
//! ```
//! use graph_combine::merge::{ChainOptions, merge_chain};
//! use graph_combine::model::{Correspondence, Graph};
//!
//! let head = Graph::builder("head")
//!     .node("A", "Constant", &[], &["A_out"])
//!     .output("A_out")
//!     .build()?;
//! let tail = Graph::builder("tail")
//!     .input("B_in")
//!     .node("B", "Relu", &["B_in"], &["B_out"])
//!     .output("B_out")
//!     .build()?;
//!
//! let prefixes = vec!["g1".to_string(), "g2".to_string()];
//! let merged = merge_chain(
//!     vec![head, tail],
//!     Some(&prefixes),
//!     &[vec![Correspondence::new("g1_A_out", "g2_B_in")]],
//!     &ChainOptions::default(),
//!     |_, _| Ok(()),
//! )?;
//! assert_eq!(merged.output_names(), vec!["g2_B_out"]);
//! # Ok::<(), graph_combine::errors::MergeError>(())
//! ```

pub mod codec;
pub mod config;
pub mod errors;
pub mod export;
pub mod merge;
pub mod model;
pub mod run;
pub mod simplify;

pub use errors::{MergeError, Result};
pub use run::{CombineRequest, combine_networks};
