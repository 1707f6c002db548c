//! Aggregation and reporting
//!
//! Pure functions over a categorized batch: per-category totals, the
//! miscategorization audit, and the plain-text report the CLI prints.

use std::fmt::Write as _;

use serde::Serialize;

use crate::models::{Category, Transaction};
use crate::rules::audit_suggestion;

/// Totals for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub total: f64,
    pub count: usize,
    pub verified_count: usize,
    /// Share of the overall total, 0.0..=100.0
    pub percent: f64,
    #[serde(skip)]
    transactions: Vec<Transaction>,
}

impl CategorySummary {
    /// The `n` largest transactions, by descending amount
    pub fn top(&self, n: usize) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = self.transactions.iter().collect();
        sorted.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        sorted.truncate(n);
        sorted
    }
}

/// Category breakdown of a batch
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Only categories with at least one transaction, by descending total
    pub categories: Vec<CategorySummary>,
    pub total_amount: f64,
    pub transaction_count: usize,
    pub verified_count: usize,
}

impl Summary {
    /// Share of transactions verified, 0.0..=100.0 (0 for an empty batch)
    pub fn verification_rate(&self) -> f64 {
        if self.transaction_count == 0 {
            0.0
        } else {
            self.verified_count as f64 * 100.0 / self.transaction_count as f64
        }
    }

    pub fn get(&self, category: Category) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Group by category and rank by total
///
/// Ties keep category order (Food, Travel, ...).
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let total_amount: f64 = transactions.iter().map(|t| t.amount).sum();

    let mut categories: Vec<CategorySummary> = Category::ALL
        .iter()
        .filter_map(|&category| {
            let members: Vec<Transaction> = transactions
                .iter()
                .filter(|t| t.category() == category)
                .cloned()
                .collect();
            if members.is_empty() {
                return None;
            }
            let total: f64 = members.iter().map(|t| t.amount).sum();
            Some(CategorySummary {
                category,
                total,
                count: members.len(),
                verified_count: members.iter().filter(|t| t.is_verified()).count(),
                percent: if total_amount > 0.0 {
                    total / total_amount * 100.0
                } else {
                    0.0
                },
                transactions: members,
            })
        })
        .collect();

    // stable sort keeps category order for equal totals
    categories.sort_by(|a, b| b.total.total_cmp(&a.total));

    Summary {
        categories,
        total_amount,
        transaction_count: transactions.len(),
        verified_count: transactions.iter().filter(|t| t.is_verified()).count(),
    }
}

/// A transaction whose description contradicts its category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Miscategorization {
    /// Zero-based position in the batch
    pub index: usize,
    pub description: String,
    pub current: Category,
    pub suggested: Category,
}

/// Flag transactions carrying a strong brand keyword for another category
///
/// Advisory only; nothing is modified.
pub fn find_miscategorized(transactions: &[Transaction]) -> Vec<Miscategorization> {
    transactions
        .iter()
        .enumerate()
        .filter_map(|(index, tx)| {
            let suggested = audit_suggestion(&tx.description)?;
            (suggested != tx.category()).then(|| Miscategorization {
                index,
                description: tx.description.clone(),
                current: tx.category(),
                suggested,
            })
        })
        .collect()
}

/// Plain-text detailed report
pub fn render_report(transactions: &[Transaction], top: usize) -> String {
    let summary = summarize(transactions);
    let mut out = String::new();

    let _ = writeln!(out, "Transactions: {}", summary.transaction_count);
    let _ = writeln!(out, "Total amount: {:.2}", summary.total_amount);
    let _ = writeln!(
        out,
        "Verified: {}/{} ({:.1}%)",
        summary.verified_count,
        summary.transaction_count,
        summary.verification_rate()
    );

    if !summary.categories.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<15} {:>12} {:>7} {:>6} {:>9}",
            "Category", "Total", "Share", "Count", "Verified"
        );
        let _ = writeln!(out, "{}", "-".repeat(53));
        for c in &summary.categories {
            let _ = writeln!(
                out,
                "{:<15} {:>12.2} {:>6.1}% {:>6} {:>9}",
                c.category.as_str(),
                c.total,
                c.percent,
                c.count,
                format!("{}/{}", c.verified_count, c.count)
            );
        }
    }

    if top > 0 {
        for c in &summary.categories {
            let _ = writeln!(out);
            let _ = writeln!(out, "Top {} in {}:", c.category, top.min(c.count));
            for tx in c.top(top) {
                let mark = if tx.is_verified() { "✓" } else { " " };
                let _ = writeln!(
                    out,
                    "  {} {:>12.2}  {}  {}",
                    mark, tx.amount, tx.direction, tx.description
                );
            }
        }
    }

    let flagged = find_miscategorized(transactions);
    let _ = writeln!(out);
    if flagged.is_empty() {
        let _ = writeln!(out, "No likely miscategorizations found.");
    } else {
        let _ = writeln!(out, "Possible miscategorizations ({}):", flagged.len());
        for m in &flagged {
            let _ = writeln!(
                out,
                "  #{} {}: {} -> suggested {}",
                m.index + 1,
                m.description,
                m.current,
                m.suggested
            );
        }
    }

    out
}
