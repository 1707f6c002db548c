//! Statement line parsers
//!
//! Text pulled out of a statement PDF is a list of ragged lines. Three
//! strategies turn those lines into transactions; the caller picks one based
//! on the document family it received:
//!
//! - `Table`: find a header row, split every following row into the same
//!   columns, and map the columns to transaction fields
//! - `Lines`: look at each line on its own for a leading date and an amount
//! - `Remote`: send the (masked) lines to the model backend and parse the
//!   JSON it returns

use std::collections::HashMap;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::ai::parsing::parse_extracted_transactions;
use crate::ai::{AIBackend, AIClient};
use crate::error::{Error, Result};
use crate::models::{Direction, NewTransaction};
use crate::prompts::{PromptId, PromptLibrary};
use crate::sensitize::{mask_digits, mask_lines};

/// Header token pairs that identify the table header row
const HEADER_TOKEN_PAIRS: [(&str, &str); 4] = [
    ("date", "amount"),
    ("date", "withdrawal"),
    ("date", "deposit"),
    ("narration", "amount"),
];

/// How to turn raw lines into transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStrategy {
    /// Header-anchored table extraction
    #[default]
    Table,
    /// Per-line date + amount regex extraction
    Lines,
    /// Model-based extraction over masked lines
    Remote,
}

impl ParseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Lines => "lines",
            Self::Remote => "remote",
        }
    }
}

impl FromStr for ParseStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "lines" | "line" | "regex" => Ok(Self::Lines),
            "remote" | "ai" => Ok(Self::Remote),
            other => Err(Error::InvalidData(format!(
                "Unknown parse strategy: {} (expected table, lines or remote)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn column_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}|\t").expect("valid regex"))
}

fn leading_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/](?:\d{4}|\d{2})\b").expect("valid regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:₹|\bRs\.?|\bINR|\$)?\s?([\d,]*\d\.\d{2})\b").expect("valid regex")
    })
}

fn trailing_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:₹|\bRs\.?|\bINR|\$)?\s?([\d,]*\d\.\d{2})\s*$").expect("valid regex")
    })
}

fn credit_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:credit|salary|cr|received)\b").expect("valid regex"))
}

/// Split a line into columns on runs of 2+ whitespace or on tabs
fn split_columns(line: &str) -> Vec<String> {
    column_split_re()
        .split(line.trim())
        .map(|f| f.trim().to_string())
        .collect()
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_TOKEN_PAIRS
        .iter()
        .any(|(a, b)| lower.contains(a) && lower.contains(b))
}

/// Whether the description reads like money coming in
pub fn has_credit_token(description: &str) -> bool {
    credit_token_re().is_match(&description.to_lowercase())
}

/// Parse an amount string, handling currency markers and thousands separators
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace('₹', "")
        .replace("Rs.", "")
        .replace("Rs", "")
        .replace("INR", "")
        .replace(['$', ',', ' '], "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidData(format!("Unable to parse amount: {}", s)))
}

/// Parse a statement date in the common day-first formats
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    // two-digit-year formats first: %Y would read "24" as year 24
    let formats = [
        "%d-%m-%y", // 12-03-24
        "%d/%m/%y", // 12/03/24
        "%d-%m-%Y", // 12-03-2024
        "%d/%m/%Y", // 12/03/2024
        "%Y-%m-%d", // 2024-03-12
        "%d %b %Y", // 12 Mar 2024
        "%d-%b-%Y", // 12-Mar-2024
        "%d %b %y", // 12 Mar 24
        "%d-%b-%y", // 12-Mar-24
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::InvalidData(format!("Unable to parse date: {}", s)))
}

/// Rows extracted under a detected header
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTable {
    pub headers: Vec<String>,
    /// Every row has exactly `headers.len()` cells
    pub rows: Vec<Vec<String>>,
}

/// Schema-driven table extraction
///
/// The first line containing a header token pair is the header. Each later
/// non-blank line is split the same way; rows with at least N-1 fields are
/// padded (or truncated) to N, and the first shorter line ends the table.
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> Result<StatementTable> {
    let mut lines = lines
        .iter()
        .map(|l| l.as_ref())
        .filter(|l| !l.trim().is_empty());

    let header = lines.by_ref().find(|l| is_header(l)).ok_or_else(|| {
        warn!("No statement header found");
        Error::SchemaNotDetected
    })?;

    let headers = split_columns(header);
    let arity = headers.len();
    let min_fields = arity.saturating_sub(1);

    let mut rows = Vec::new();
    for line in lines {
        let mut fields = split_columns(line);
        if fields.len() < min_fields {
            debug!(line, "Table ended at short line");
            break;
        }
        fields.resize(arity, String::new());
        rows.push(fields);
    }

    info!(columns = arity, rows = rows.len(), "Parsed statement table");
    Ok(StatementTable { headers, rows })
}

/// What a table column holds, judged from its header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ColumnRole {
    Date,
    Description,
    Amount,
    Withdrawal,
    Deposit,
    Balance,
    Type,
}

impl ColumnRole {
    fn detect(header: &str) -> Option<Self> {
        let h = header.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| h.contains(w));

        if has(&["balance"]) {
            Some(Self::Balance)
        } else if has(&["withdrawal", "debit"]) {
            Some(Self::Withdrawal)
        } else if has(&["deposit", "credit"]) {
            Some(Self::Deposit)
        } else if has(&["date"]) {
            Some(Self::Date)
        } else if has(&["narration", "description", "particulars", "details", "remarks"]) {
            Some(Self::Description)
        } else if has(&["amount"]) {
            Some(Self::Amount)
        } else if has(&["type", "dr/cr"]) {
            Some(Self::Type)
        } else {
            None
        }
    }
}

/// Direction spelled out in a cell ("Credit", "CR", "Debit", "DR")
fn direction_word(cell: &str) -> Option<Direction> {
    Direction::from_str(cell).ok()
}

/// Direction from a DR/CR cell, else from the narration, else a debit
fn scan_direction(row: &[String], description_idx: Option<usize>, description: &str) -> Direction {
    row.iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != description_idx)
        .find_map(|(_, c)| direction_word(c))
        .unwrap_or_else(|| {
            if has_credit_token(description) {
                Direction::Credit
            } else {
                Direction::Debit
            }
        })
}

impl StatementTable {
    /// First column for each role (leftmost wins)
    fn roles(&self) -> HashMap<ColumnRole, usize> {
        let mut roles = HashMap::new();
        for (i, header) in self.headers.iter().enumerate() {
            if let Some(role) = ColumnRole::detect(header) {
                roles.entry(role).or_insert(i);
            }
        }
        roles
    }

    /// Map rows to transactions by column role
    ///
    /// Rows without a usable amount are dropped.
    pub fn to_transactions(&self) -> Vec<NewTransaction> {
        let roles = self.roles();
        let cell = |row: &[String], role: ColumnRole| -> Option<String> {
            roles
                .get(&role)
                .and_then(|&i| row.get(i))
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
        };

        // blank, "-" and 0.00 cells all mean "nothing in this column"
        let money = |row: &[String], role: ColumnRole| -> Option<f64> {
            cell(row, role)
                .and_then(|c| parse_amount(&c).ok())
                .filter(|v| *v > 0.0)
        };
        let description_idx = roles.get(&ColumnRole::Description).copied();

        let mut transactions = Vec::new();
        for row in &self.rows {
            let mut description = cell(row, ColumnRole::Description).unwrap_or_default();

            // A row one field short had an empty column merged away, so the
            // cells after the narration are shifted left. With a balance
            // column the last figure is the balance and the one before it
            // is the amount; which column it came from is lost.
            if let Some(amount) = self.shifted_amount(row, &roles) {
                let direction = scan_direction(row, description_idx, &description);
                let date = cell(row, ColumnRole::Date).and_then(|c| parse_date(&c).ok());
                transactions
                    .push(NewTransaction::new(&description, amount, direction).with_date(date));
                continue;
            }

            let deposit = money(row, ColumnRole::Deposit);
            let withdrawal = money(row, ColumnRole::Withdrawal);

            let mut amount = money(row, ColumnRole::Amount);
            if amount.is_none() {
                amount = deposit.or(withdrawal);
            }
            if amount.is_none() {
                // shifted columns: the amount got merged into the narration
                if let Some((desc, value)) = split_trailing_amount(&description) {
                    description = desc;
                    amount = Some(value);
                }
            }
            let Some(amount) = amount else {
                debug!(?row, "Dropped table row without amount");
                continue;
            };

            let direction = if deposit.is_some() {
                Direction::Credit
            } else if withdrawal.is_some() {
                Direction::Debit
            } else {
                scan_direction(row, description_idx, &description)
            };

            let date = cell(row, ColumnRole::Date).and_then(|c| parse_date(&c).ok());
            transactions.push(NewTransaction::new(&description, amount, direction).with_date(date));
        }

        debug!(
            rows = self.rows.len(),
            transactions = transactions.len(),
            "Mapped table rows"
        );
        transactions
    }

    /// Amount of a padded row in a table with a balance column
    fn shifted_amount(&self, row: &[String], roles: &HashMap<ColumnRole, usize>) -> Option<f64> {
        roles.get(&ColumnRole::Balance)?;
        let padded = row.last().is_some_and(|c| c.is_empty());
        if !padded {
            return None;
        }

        let start = roles.get(&ColumnRole::Description).map_or(0, |&i| i + 1);
        let figures: Vec<f64> = row
            .iter()
            .skip(start)
            .filter_map(|c| parse_amount(c).ok())
            .collect();
        match figures.as_slice() {
            [.., amount, _balance] if *amount > 0.0 => Some(*amount),
            _ => None,
        }
    }

    /// Write headers and rows as CSV
    ///
    /// Narration cells and cells of unrecognized columns are masked; date and
    /// amount columns are written as read.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let masked: Vec<bool> = self
            .headers
            .iter()
            .map(|h| matches!(ColumnRole::detect(h), None | Some(ColumnRole::Description)))
            .collect();

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().zip(&masked).map(|(cell, &mask)| {
                if mask {
                    mask_digits(cell)
                } else {
                    cell.clone()
                }
            }))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Split "SWIGGY ORDER 450.00" into ("SWIGGY ORDER", 450.0)
fn split_trailing_amount(text: &str) -> Option<(String, f64)> {
    let caps = trailing_amount_re().captures(text)?;
    let whole = caps.get(0)?;
    let value = parse_amount(caps.get(1)?.as_str()).ok()?;
    Some((text[..whole.start()].trim().to_string(), value))
}

/// Line-regex extraction
///
/// A line yields a transaction only if it starts with a date token and has an
/// amount token after it. The description is the text in between.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<NewTransaction> {
    let transactions: Vec<NewTransaction> = lines
        .iter()
        .filter_map(|line| parse_line(line.as_ref()))
        .collect();
    info!(
        lines = lines.len(),
        transactions = transactions.len(),
        "Parsed statement lines"
    );
    transactions
}

fn parse_line(line: &str) -> Option<NewTransaction> {
    let line = line.trim();
    let date_match = leading_date_re().find(line)?;
    let rest = &line[date_match.end()..];

    let caps = amount_re().captures(rest)?;
    let token = caps.get(0)?;
    let amount = parse_amount(caps.get(1)?.as_str()).ok()?;

    let description = rest[..token.start()].trim();
    if description.is_empty() {
        return None;
    }

    let direction = if has_credit_token(description) {
        Direction::Credit
    } else {
        Direction::Debit
    };
    let date = parse_date(date_match.as_str()).ok();

    Some(NewTransaction::new(description, amount, direction).with_date(date))
}

/// The extraction prompt for `lines`, masked as it would be sent
///
/// `None` when no non-blank line is left to send.
pub fn extraction_prompt<S: AsRef<str>>(
    prompts: &mut PromptLibrary,
    lines: &[S],
) -> Result<Option<String>> {
    let masked: Vec<String> = mask_lines(lines)
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect();
    if masked.is_empty() {
        return Ok(None);
    }

    let text = masked.join("\n");
    let vars = HashMap::from([("lines", text.as_str())]);
    debug!(lines = masked.len(), "Rendered extraction prompt");
    prompts.render(PromptId::ExtractTransactions, &vars).map(Some)
}

/// Model-based extraction
///
/// Lines are masked before they are sent. An empty input makes no call.
pub async fn extract_remote<S: AsRef<str>>(
    client: &AIClient,
    prompts: &mut PromptLibrary,
    lines: &[S],
) -> Result<Vec<NewTransaction>> {
    let Some(prompt) = extraction_prompt(prompts, lines)? else {
        return Ok(Vec::new());
    };

    debug!(host = client.host(), "Requesting remote extraction");
    let response = client.complete(&prompt).await?;
    let transactions = parse_extracted_transactions(&response)?;
    info!(transactions = transactions.len(), "Extracted transactions remotely");
    Ok(transactions)
}

/// Run the chosen strategy over `lines`
///
/// `Remote` requires a client; without one it is a configuration error.
pub async fn extract<S: AsRef<str>>(
    strategy: ParseStrategy,
    lines: &[S],
    client: Option<&AIClient>,
    prompts: &mut PromptLibrary,
) -> Result<Vec<NewTransaction>> {
    match strategy {
        ParseStrategy::Table => Ok(parse_table(lines)?.to_transactions()),
        ParseStrategy::Lines => Ok(parse_lines(lines)),
        ParseStrategy::Remote => {
            let client = client.ok_or_else(|| {
                Error::Config("Remote extraction needs a configured AI backend".into())
            })?;
            extract_remote(client, prompts, lines).await
        }
    }
}
