//! Categorization and verification command

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{
    auto_verify, load_transactions, review_ambiguous, save_categorized, summarize, AIBackend,
    Categorization, Classifier, Config, ConsoleInput, ReviewInput,
};

use super::truncate;

pub async fn cmd_categorize(
    config: &Config,
    input: &Path,
    output: &Path,
    no_review: bool,
) -> Result<()> {
    if no_review {
        categorize_file(config, input, output, None).await
    } else {
        let mut console = ConsoleInput::stdio();
        categorize_file(config, input, output, Some(&mut console)).await
    }
}

/// Classify, auto-verify, optionally review, then save
///
/// `review` is `None` when ambiguous transactions should stay unverified.
pub async fn categorize_file(
    config: &Config,
    input: &Path,
    output: &Path,
    review: Option<&mut dyn ReviewInput>,
) -> Result<()> {
    let batch = load_transactions(input)
        .with_context(|| format!("Failed to read transactions: {}", input.display()))?;

    let mut classifier = Classifier::from_config(config)?;
    match classifier.client() {
        Some(client) => println!(
            "🤖 Categorizing {} transactions with {} ({})...",
            batch.len(),
            client.backend_name(),
            client.model()
        ),
        None => println!(
            "📏 Categorizing {} transactions with keyword rules...",
            batch.len()
        ),
    }

    let Categorization {
        mut transactions,
        by_remote,
        by_fallback,
        remote_error,
    } = classifier.categorize(batch).await;

    println!("   By model: {}", by_remote);
    println!("   By rules: {}", by_fallback);
    if let Some(err) = remote_error {
        println!("   ⚠️  Model request failed: {}", truncate(&err, 100));
    }

    let auto = auto_verify(&mut transactions);
    println!("✅ Auto-verified: {}", auto);

    let pending = transactions.iter().filter(|t| !t.is_verified()).count();
    match review {
        Some(input) if pending > 0 => {
            println!();
            println!("🔎 Reviewing {} ambiguous transactions", pending);
            let outcome = review_ambiguous(&mut transactions, input);
            println!();
            println!("   Confirmed:   {}", outcome.confirmed);
            println!("   Corrections: {}", outcome.corrections);
            if outcome.skipped > 0 {
                println!("   Skipped:     {}", outcome.skipped);
            }
        }
        _ if pending > 0 => println!("   Left unverified: {}", pending),
        _ => {}
    }

    save_categorized(output, &transactions)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let summary = summarize(&transactions);
    println!();
    println!("📊 Summary");
    for c in &summary.categories {
        println!(
            "   {:<15} {:>12.2}  ({} transactions)",
            c.category.as_str(),
            c.total,
            c.count
        );
    }
    println!(
        "   Verified: {}/{} ({:.1}%)",
        summary.verified_count,
        summary.transaction_count,
        summary.verification_rate()
    );
    println!("   Saved to {}", output.display());

    Ok(())
}
