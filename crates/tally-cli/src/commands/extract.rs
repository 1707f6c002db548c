//! Statement extraction command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{
    extract, parse_table, save_transactions, source::source_for_path, AIClient, Config, Error,
    NewTransaction, ParseStrategy, PromptLibrary,
};

pub async fn cmd_extract(
    config: &Config,
    file: &Path,
    password: Option<&str>,
    strategy: &str,
    output: &Path,
    table_csv: Option<&Path>,
) -> Result<()> {
    let strategy: ParseStrategy = strategy.parse()?;

    println!("📄 Reading {}...", file.display());

    let text = match source_for_path(file).read_lines(password) {
        Ok(text) => text,
        Err(Error::PasswordRequired) => {
            anyhow::bail!(
                "{} is encrypted.\nPass the statement password with --password",
                file.display()
            )
        }
        Err(Error::WrongPassword) => {
            anyhow::bail!("Wrong password for {}", file.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read statement: {}", file.display()))
        }
    };

    if text.decryption.decrypted() {
        println!("   Decrypted with the given password");
    }
    println!("   Read {} lines", text.lines.len());

    let transactions = match (strategy, table_csv) {
        (ParseStrategy::Table, Some(csv_path)) => {
            let table = parse_table(&text.lines).map_err(schema_hint)?;
            let csv_file = File::create(csv_path)
                .with_context(|| format!("Failed to create file: {}", csv_path.display()))?;
            table.write_csv(csv_file)?;
            println!(
                "   Wrote {} table rows to {}",
                table.rows.len(),
                csv_path.display()
            );
            table.to_transactions()
        }
        (strategy, table_csv) => {
            if table_csv.is_some() {
                tracing::warn!(%strategy, "--table-csv only applies to the table strategy, ignoring");
            }
            let client = match strategy {
                ParseStrategy::Remote => AIClient::from_config(&config.ai)?,
                _ => None,
            };
            let mut prompts = PromptLibrary::new();
            extract(strategy, &text.lines, client.as_ref(), &mut prompts)
                .await
                .map_err(schema_hint)?
        }
    };

    save_transactions(output, &transactions)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_extract_summary(strategy, &transactions);
    println!("   Saved to {}", output.display());

    Ok(())
}

/// Point at the other strategies when no table header was found
fn schema_hint(e: Error) -> anyhow::Error {
    match e {
        Error::SchemaNotDetected => anyhow::anyhow!(
            "{}\nTry --strategy lines (or --strategy remote with a model backend configured)",
            e
        ),
        other => other.into(),
    }
}

fn print_extract_summary(strategy: ParseStrategy, transactions: &[NewTransaction]) {
    let credits: f64 = transactions
        .iter()
        .filter(|t| t.is_credit())
        .map(|t| t.amount)
        .sum();
    let debits: f64 = transactions
        .iter()
        .filter(|t| !t.is_credit())
        .map(|t| t.amount)
        .sum();

    println!("✅ Extracted {} transactions ({})", transactions.len(), strategy);
    println!("   Credits: {:.2}", credits);
    println!("   Debits:  {:.2}", debits);
}
