//! JSON persistence for transaction lists
//!
//! Two files flow between pipeline runs:
//! - extracted list: `[{"desc", "type", "amount", "date"?}]`
//! - categorized list: the same plus `"category"` and `"verified"`
//!
//! Records are re-sanitized on read, so a hand-edited file can't smuggle an
//! unmasked account number or a negative amount into the pipeline.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::models::{NewTransaction, Transaction};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn write_json<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, items)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read an extracted transaction list
pub fn load_transactions(path: &Path) -> Result<Vec<NewTransaction>> {
    let transactions: Vec<NewTransaction> = read_json(path)?;
    debug!(path = %path.display(), count = transactions.len(), "Loaded transactions");
    Ok(transactions
        .into_iter()
        .map(NewTransaction::sanitized)
        .collect())
}

/// Write an extracted transaction list
pub fn save_transactions(path: &Path, transactions: &[NewTransaction]) -> Result<()> {
    write_json(path, transactions)?;
    debug!(path = %path.display(), count = transactions.len(), "Saved transactions");
    Ok(())
}

/// Read a categorized transaction list
pub fn load_categorized(path: &Path) -> Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = read_json(path)?;
    debug!(path = %path.display(), count = transactions.len(), "Loaded categorized transactions");
    Ok(transactions.into_iter().map(Transaction::sanitized).collect())
}

/// Write a categorized transaction list
pub fn save_categorized(path: &Path, transactions: &[Transaction]) -> Result<()> {
    write_json(path, transactions)?;
    debug!(path = %path.display(), count = transactions.len(), "Saved categorized transactions");
    Ok(())
}
