//! Configuration data structures for the combine pipeline.
//!
//! Groups:
//! - [`MergeConfig`]: top-level container for all config groups
//! - [`NamingConfig`]: how prefixes are joined to identifiers
//! - [`CanonicalConfig`]: final canonicalization options
//! - [`PersistConfig`]: which extra artifacts get written
//! - [`SimplifyConfig`]: the best-effort simplification post-pass
//!
//! All structs are `serde`-friendly so they can be loaded from JSON.

use crate::merge::chain::ChainOptions;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub canonical: CanonicalConfig,
    #[serde(default)]
    pub persist: PersistConfig,
    #[serde(default)]
    pub simplify: SimplifyConfig,
}

impl MergeConfig {
    /// Validate config sanity.
    pub fn validate(&self) -> Result<()> {
        if self.naming.separator.is_empty() {
            return Err(anyhow!("`separator` must not be empty"));
        }
        if self.naming.separator.chars().any(char::is_whitespace) {
            return Err(anyhow!(
                "`separator` must not contain whitespace: {:?}",
                self.naming.separator
            ));
        }
        Ok(())
    }

    pub fn chain_options(&self) -> ChainOptions {
        ChainOptions {
            separator: self.naming.separator.clone(),
            strip_head_prefix: self.canonical.strip_head_prefix,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Inserted between a prefix and the original identifier.
    pub separator: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            separator: "_".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalConfig {
    /// Give the single surviving graph input its unprefixed name back.
    pub strip_head_prefix: bool,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            strip_head_prefix: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistConfig {
    /// Write the accumulated graph after every pairwise step.
    pub output_intermediate: bool,
    /// Write `<output-stem>.summary.json` next to the output.
    pub write_summary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifyConfig {
    /// Run the simplifier on the final graph.
    pub enabled: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
