//! Domain models for Tally

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sensitize::mask_digits;

/// Spending/income buckets. The set is closed: anything a model or a human
/// proposes outside of it is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Food,
    Travel,
    Rent,
    Shopping,
    Income,
    Bills,
    Entertainment,
    Other,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 8] = [
        Self::Food,
        Self::Travel,
        Self::Rent,
        Self::Shopping,
        Self::Income,
        Self::Bills,
        Self::Entertainment,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Travel => "Travel",
            Self::Rent => "Rent",
            Self::Shopping => "Shopping",
            Self::Income => "Income",
            Self::Bills => "Bills",
            Self::Entertainment => "Entertainment",
            Self::Other => "Other",
        }
    }

    /// Exact, case-sensitive lookup. Used for model output, where only a
    /// literal member of the set is accepted.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Comma-separated list of all labels (for prompts and help text)
    pub fn list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Case-insensitive lookup, for human input
impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money in or money out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" | "cr" => Ok(Self::Credit),
            "debit" | "dr" => Ok(Self::Debit),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction as extracted from a statement, before categorization
///
/// Serialized form is the persisted transaction list:
/// `{"desc": ..., "type": "Credit"|"Debit", "amount": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Magnitude only; the sign lives in `direction`
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl NewTransaction {
    /// Build a transaction, masking the description and dropping the sign
    pub fn new(description: &str, amount: f64, direction: Direction) -> Self {
        Self {
            description: mask_digits(description.trim()),
            direction,
            amount: amount.abs(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// Re-apply the construction invariants to a record read from disk
    pub fn sanitized(self) -> Self {
        Self::new(&self.description, self.amount, self.direction).with_date(self.date)
    }

    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }
}

/// A categorized transaction
///
/// `category` and `verified` are only reachable through methods: once a
/// transaction is verified nothing can mark it unverified again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    category: Category,
    verified: bool,
}

impl Transaction {
    /// Attach a category to an extracted transaction (unverified)
    pub fn categorized(tx: NewTransaction, category: Category) -> Self {
        Self {
            description: tx.description,
            direction: tx.direction,
            amount: tx.amount,
            date: tx.date,
            category,
            verified: false,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }

    /// Confirm the current category
    pub fn mark_verified(&mut self) {
        self.verified = true;
    }

    /// Replace the category with a human correction and verify it
    pub fn correct(&mut self, category: Category) {
        self.category = category;
        self.verified = true;
    }

    /// Re-apply the construction invariants to a record read from disk
    pub fn sanitized(mut self) -> Self {
        self.description = mask_digits(self.description.trim());
        self.amount = self.amount.abs();
        self
    }
}
