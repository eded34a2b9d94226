//! The merge engine: namespacing, collision checks, splicing, input pruning,
//! canonicalization and the N-graph fold that drives them.

pub mod canonical;
pub mod chain;
pub mod collision;
pub mod namespace;
pub mod prune;
pub mod splice;

pub use canonical::{CanonicalizeOptions, canonicalize, canonicalize_with};
pub use chain::{ChainOptions, merge_chain};
pub use collision::{detect_collisions, has_duplicates};
pub use namespace::namespace;
pub use prune::prune_unused_inputs;
pub use splice::splice;
