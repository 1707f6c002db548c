//! Report command

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{find_miscategorized, load_categorized, render_report, summarize};

/// Print the detailed category report and audit for a categorized list
///
/// With `json`, prints the summary and audit list as JSON instead.
pub fn cmd_report(input: &Path, top: usize, json: bool) -> Result<()> {
    let transactions = load_categorized(input)
        .with_context(|| format!("Failed to read categorized transactions: {}", input.display()))?;

    if json {
        let output = serde_json::json!({
            "summary": summarize(&transactions),
            "miscategorized": find_miscategorized(&transactions),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No transactions in {}", input.display());
        return Ok(());
    }

    print!("{}", render_report(&transactions, top));
    Ok(())
}
