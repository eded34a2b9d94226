//! Configuration loader and validator.
//!
//! Responsibilities:
//! - Read environment variables to populate [`MergeConfig`]
//! - Apply defaults when values are missing
//! - Validate constraints (e.g., the separator must be non-empty)

pub mod model;

use crate::config::model::MergeConfig;
use anyhow::{Result, anyhow};

pub const ENV_SEPARATOR: &str = "NET_COMBINE_SEPARATOR";
pub const ENV_STRIP_HEAD_PREFIX: &str = "NET_COMBINE_STRIP_HEAD_PREFIX";
pub const ENV_SIMPLIFY: &str = "NET_COMBINE_SIMPLIFY";
pub const ENV_WRITE_SUMMARY: &str = "NET_COMBINE_WRITE_SUMMARY";

/// Load [`MergeConfig`] from ENV variables, falling back to defaults if not set.
pub fn load_from_env_or_default() -> Result<MergeConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Same as [`load_from_env_or_default`] with an injectable variable lookup.
pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<MergeConfig> {
    let mut cfg = MergeConfig::default();

    if let Some(sep) = lookup(ENV_SEPARATOR) {
        cfg.naming.separator = sep;
    }
    if let Some(v) = lookup(ENV_STRIP_HEAD_PREFIX) {
        cfg.canonical.strip_head_prefix = parse_flag(ENV_STRIP_HEAD_PREFIX, &v)?;
    }
    if let Some(v) = lookup(ENV_SIMPLIFY) {
        cfg.simplify.enabled = parse_flag(ENV_SIMPLIFY, &v)?;
    }
    if let Some(v) = lookup(ENV_WRITE_SUMMARY) {
        cfg.persist.write_summary = parse_flag(ENV_WRITE_SUMMARY, &v)?;
    }

    cfg.validate()?;
    Ok(cfg)
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{key}: unrecognized boolean {other:?}")),
    }
}
