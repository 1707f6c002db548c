//! Keyword and threshold rules
//!
//! Three ordered rule tables drive the deterministic parts of the pipeline:
//! - `FALLBACK_RULES`: category assignment when the model gives nothing usable
//! - `AUTO_VERIFY_RULES`: categories that can be confirmed without a human
//! - `AUDIT_RULES`: strong brand keywords used to flag likely miscategorizations
//!
//! Every table is evaluated in array order and the first matching rule wins.
//! Keywords are lowercase and matched as substrings of the lowercased description.

use crate::models::{Category, Direction};

/// Credits strictly above this amount count as income
pub const HIGH_VALUE_CREDIT_THRESHOLD: f64 = 10_000.0;

/// Test applied to a transaction's fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    /// Description contains any of the keywords
    AnyKeyword(&'static [&'static str]),
    /// Credit with amount strictly above `HIGH_VALUE_CREDIT_THRESHOLD`
    HighValueCredit,
}

impl Predicate {
    /// `description_lower` must already be lowercased
    pub fn matches(&self, description_lower: &str, direction: Direction, amount: f64) -> bool {
        match self {
            Self::AnyKeyword(keywords) => keywords.iter().any(|k| description_lower.contains(k)),
            Self::HighValueCredit => is_high_value_credit(direction, amount),
        }
    }
}

/// A tagged rule: if the predicate holds, the tag applies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub category: Category,
    pub predicate: Predicate,
}

const fn keywords(category: Category, words: &'static [&'static str]) -> Rule {
    Rule {
        category,
        predicate: Predicate::AnyKeyword(words),
    }
}

/// Fallback categorization, in priority order. No match means `Other`.
pub const FALLBACK_RULES: &[Rule] = &[
    keywords(
        Category::Food,
        &["zomato", "swiggy", "food", "restaurant", "cafe", "eatclub"],
    ),
    keywords(Category::Travel, &["uber", "taxi", "fuel", "travel"]),
    keywords(Category::Rent, &["rent", "rentomojo"]),
    keywords(
        Category::Shopping,
        &["amazon", "flipkart", "shop", "lifestyle", "envogue"],
    ),
    keywords(
        Category::Entertainment,
        &["netflix", "spotify", "jio", "recharge"],
    ),
    keywords(Category::Bills, &["bill", "charges", "sms"]),
    Rule {
        category: Category::Income,
        predicate: Predicate::HighValueCredit,
    },
];

/// Categories confirmed without review when the description backs them up
pub const AUTO_VERIFY_RULES: &[Rule] = &[
    keywords(
        Category::Food,
        &[
            "zomato",
            "swiggy",
            "zepto",
            "eatclub",
            "dominos",
            "pizza",
            "restaurant",
            "cafe",
        ],
    ),
    keywords(
        Category::Travel,
        &["uber", "ola", "taxi", "fuel", "petrol", "diesel", "metro"],
    ),
    keywords(
        Category::Entertainment,
        &["netflix", "spotify", "prime", "hotstar", "youtube", "gaming"],
    ),
    keywords(
        Category::Bills,
        &[
            "electricity",
            "water",
            "gas",
            "internet",
            "mobile",
            "recharge",
            "jio",
            "airtel",
        ],
    ),
    keywords(Category::Rent, &["rent", "rentomojo", "rental"]),
    keywords(
        Category::Shopping,
        &[
            "amazon",
            "flipkart",
            "myntra",
            "lifestyle",
            "shopping",
            "envogue",
        ],
    ),
    Rule {
        category: Category::Income,
        predicate: Predicate::HighValueCredit,
    },
];

/// Brand keywords strong enough to contradict an assigned category
pub const AUDIT_RULES: &[Rule] = &[
    keywords(Category::Food, &["zomato", "swiggy"]),
    keywords(Category::Entertainment, &["netflix", "spotify"]),
    keywords(Category::Rent, &["rent"]),
];

pub fn is_high_value_credit(direction: Direction, amount: f64) -> bool {
    direction == Direction::Credit && amount > HIGH_VALUE_CREDIT_THRESHOLD
}

/// First rule in `rules` whose predicate holds
pub fn first_match(
    rules: &[Rule],
    description: &str,
    direction: Direction,
    amount: f64,
) -> Option<Category> {
    let lower = description.to_lowercase();
    rules
        .iter()
        .find(|r| r.predicate.matches(&lower, direction, amount))
        .map(|r| r.category)
}

/// Deterministic category for a transaction the model could not place
pub fn fallback_category(description: &str, direction: Direction, amount: f64) -> Category {
    first_match(FALLBACK_RULES, description, direction, amount).unwrap_or(Category::Other)
}

/// Whether `category` is backed by an auto-verify rule for this transaction
///
/// `Other` is never auto-verified.
pub fn supports_auto_verify(
    category: Category,
    description: &str,
    direction: Direction,
    amount: f64,
) -> bool {
    if category == Category::Other {
        return false;
    }
    let lower = description.to_lowercase();
    AUTO_VERIFY_RULES
        .iter()
        .filter(|r| r.category == category)
        .any(|r| r.predicate.matches(&lower, direction, amount))
}

/// Category suggested by the strongest brand keyword in the description, if any
pub fn audit_suggestion(description: &str) -> Option<Category> {
    // audit rules are keyword-only, direction and amount are irrelevant
    first_match(AUDIT_RULES, description, Direction::Debit, 0.0)
}
