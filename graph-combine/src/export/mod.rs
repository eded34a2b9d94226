//! Side artifacts written next to the combined graph.

pub mod graphml;
pub mod summary;

pub use graphml::write_graphml;
pub use summary::{CombineSummary, write_summary};
