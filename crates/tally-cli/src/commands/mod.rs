//! CLI command implementations
//!
//! Commands are organized by pipeline stage:
//! - `extract` - Statement reading and transaction extraction
//! - `categorize` - Classification, auto-verification and review
//! - `report` - Category summary and miscategorization audit
//! - `ai` - Model backend health check
//! - `prompts` - Prompt template listing and previews

pub mod ai;
pub mod categorize;
pub mod extract;
pub mod prompts;
pub mod report;

// Re-export command functions for main.rs
pub use ai::*;
pub use categorize::*;
pub use extract::*;
pub use prompts::*;
pub use report::*;

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::Config;

/// Load configuration, reporting where it came from
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).context("Failed to load configuration")?;
    match &config.source {
        Some(source) => tracing::debug!(path = %source.display(), "Loaded configuration"),
        None => tracing::debug!("Using built-in configuration"),
    }
    Ok(config)
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
