//! Verification
//!
//! Two passes over a categorized batch:
//! 1. `auto_verify`: confirm categories the description or amount backs up
//! 2. `review_ambiguous`: ask a human about everything still unverified,
//!    once each, in order
//!
//! The review pass pulls answers from a [`ReviewInput`], so the same state
//! machine runs against a terminal in production and a script in tests.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::models::{Category, Transaction};
use crate::rules::supports_auto_verify;

/// Mark every unverified transaction whose category is backed by a rule
///
/// Returns how many were newly verified. Running it again returns 0 and
/// changes nothing.
pub fn auto_verify(transactions: &mut [Transaction]) -> usize {
    let mut verified = 0;
    for tx in transactions.iter_mut().filter(|t| !t.is_verified()) {
        if supports_auto_verify(tx.category(), &tx.description, tx.direction, tx.amount) {
            tx.mark_verified();
            verified += 1;
        }
    }
    info!(
        verified,
        remaining = transactions.iter().filter(|t| !t.is_verified()).count(),
        "Auto-verified transactions"
    );
    verified
}

/// Source of human answers for the review pass
pub trait ReviewInput {
    /// Show `prompt` and return the answer; `None` means input has ended
    fn ask(&mut self, prompt: &str) -> Option<String>;

    /// Show an informational line
    fn show(&mut self, message: &str);
}

/// Review input over any reader/writer pair (stdin/stdout in the CLI)
pub struct ConsoleInput<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsoleInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl ConsoleInput<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Console input on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ReviewInput for ConsoleInput<R, W> {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        if write!(self.writer, "{}", prompt)
            .and_then(|_| self.writer.flush())
            .is_err()
        {
            return None;
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                warn!("Failed to read review input: {}", e);
                None
            }
        }
    }

    fn show(&mut self, message: &str) {
        let _ = writeln!(self.writer, "{}", message);
    }
}

/// Review input from a fixed list of answers
///
/// Everything shown or asked is recorded in `transcript`.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    pub transcript: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl ReviewInput for ScriptedInput {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        self.transcript.push(prompt.to_string());
        self.answers.pop_front()
    }

    fn show(&mut self, message: &str) {
        self.transcript.push(message.to_string());
    }
}

/// Answer to "is this categorization correct?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Response {
    Confirm,
    Correct,
    SkipRemaining,
}

impl Response {
    fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(Self::Confirm),
            "n" | "no" => Some(Self::Correct),
            "s" | "skip" => Some(Self::SkipRemaining),
            _ => None,
        }
    }
}

/// Per-transaction review state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewState {
    Prompting,
    ChoosingCategory,
    Confirmed,
    Corrected(Category),
    Skipped,
}

const CONFIRM_PROMPT: &str = "Is this correct? [y]es / [n]o / [s]kip remaining: ";

/// Drive one transaction to a terminal state
fn review_one(input: &mut dyn ReviewInput) -> ReviewState {
    let mut state = ReviewState::Prompting;
    loop {
        state = match state {
            ReviewState::Prompting => match input.ask(CONFIRM_PROMPT) {
                None => ReviewState::Skipped,
                Some(answer) => match Response::parse(&answer) {
                    Some(Response::Confirm) => ReviewState::Confirmed,
                    Some(Response::Correct) => ReviewState::ChoosingCategory,
                    Some(Response::SkipRemaining) => ReviewState::Skipped,
                    None => {
                        input.show("Please answer y, n or s.");
                        ReviewState::Prompting
                    }
                },
            },
            ReviewState::ChoosingCategory => {
                let prompt = format!("Correct category ({}): ", Category::list());
                match input.ask(&prompt) {
                    None => ReviewState::Skipped,
                    Some(answer) => match answer.parse::<Category>() {
                        Ok(category) => ReviewState::Corrected(category),
                        Err(e) => {
                            input.show(&format!("{}. Choose one of: {}", e, Category::list()));
                            ReviewState::ChoosingCategory
                        }
                    },
                }
            }
            terminal => return terminal,
        };
    }
}

/// What happened in the review pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Transactions that reached a decision (confirmed or corrected)
    pub reviewed: usize,
    pub confirmed: usize,
    pub corrections: usize,
    /// Transactions left unverified by skip-remaining or end of input
    pub skipped: usize,
}

/// Ask about each unverified transaction once, in order
///
/// Skip-remaining (or end of input) stops the pass cleanly and leaves the
/// current and all later transactions unverified.
pub fn review_ambiguous(
    transactions: &mut [Transaction],
    input: &mut dyn ReviewInput,
) -> ReviewOutcome {
    let pending: Vec<usize> = transactions
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_verified())
        .map(|(i, _)| i)
        .collect();
    let total = pending.len();

    let mut outcome = ReviewOutcome::default();
    for (position, &idx) in pending.iter().enumerate() {
        let tx = &mut transactions[idx];
        input.show(&format!(
            "\n[{}/{}] {} | {:.2} | {} | category: {}",
            position + 1,
            total,
            tx.description,
            tx.amount,
            tx.direction,
            tx.category()
        ));

        match review_one(input) {
            ReviewState::Confirmed => {
                tx.mark_verified();
                outcome.confirmed += 1;
                outcome.reviewed += 1;
            }
            ReviewState::Corrected(category) => {
                debug!(from = %tx.category(), to = %category, "Category corrected");
                tx.correct(category);
                outcome.corrections += 1;
                outcome.reviewed += 1;
            }
            _ => {
                outcome.skipped = total - position;
                break;
            }
        }
    }

    info!(
        reviewed = outcome.reviewed,
        corrections = outcome.corrections,
        skipped = outcome.skipped,
        "Review finished"
    );
    outcome
}

/// Counts from a full verification run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verification {
    pub auto_verified: usize,
    pub review: ReviewOutcome,
}

/// Auto-verify, then review whatever is left
pub fn review(transactions: &mut [Transaction], input: &mut dyn ReviewInput) -> Verification {
    let auto_verified = auto_verify(transactions);
    let review = review_ambiguous(transactions, input);
    Verification {
        auto_verified,
        review,
    }
}
