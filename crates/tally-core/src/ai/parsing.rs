//! JSON parsing helpers for model responses
//!
//! Models wrap their JSON in prose and code fences, and sometimes emit broken
//! JSON. These helpers locate the outermost array and, when it doesn't parse
//! as a whole, recover every top-level object that does.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::import::parse_amount;
use crate::models::{Category, Direction, NewTransaction};

use super::truncate_raw;

/// Slice of `response` from the first `[` to the last `]`
///
/// If there is an opening bracket but no closing one after it (a truncated
/// response), the slice runs to the end so that object recovery can still
/// salvage complete entries.
pub fn extract_json_array(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('[').ok_or_else(|| {
        Error::Ai(format!(
            "No JSON array found in model response | Raw: {}",
            truncate_raw(response)
        ))
    })?;

    match response.rfind(']') {
        Some(end) if end > start => Ok(&response[start..=end]),
        _ => Ok(&response[start..]),
    }
}

/// Parse an array of JSON values, falling back to per-object recovery
///
/// Errors only when nothing at all could be recovered.
fn parse_values(array: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Vec<Value>>(array) {
        Ok(values) => Ok(values),
        Err(e) => {
            let recovered = recover_objects(array);
            if recovered.is_empty() {
                return Err(Error::Ai(format!(
                    "Invalid JSON from model: {} | Raw: {}",
                    e,
                    truncate_raw(array)
                )));
            }
            tracing::debug!(
                recovered = recovered.len(),
                "Recovered entries from malformed model JSON"
            );
            Ok(recovered)
        }
    }
}

/// Every top-level `{...}` in `text` that parses as JSON on its own
fn recover_objects(text: &str) -> Vec<Value> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Ok(value) = serde_json::from_str::<Value>(&text[s..=i]) {
                            objects.push(value);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    objects
}

/// Index field as a positive integer (number or numeric string)
fn index_of(entry: &Value) -> Option<usize> {
    match entry.get("index")? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a batch categorization response into an index -> category map
///
/// Only entries whose index is in `1..=count` and whose category is a literal
/// member of the category set are kept. Later entries for the same index
/// replace earlier ones.
pub fn parse_categorizations(response: &str, count: usize) -> Result<HashMap<usize, Category>> {
    let array = extract_json_array(response)?;
    let entries = parse_values(array)?;

    let mut mapping = HashMap::new();
    let mut rejected = 0usize;
    for entry in &entries {
        let index = index_of(entry).filter(|i| (1..=count).contains(i));
        let category = entry
            .get("category")
            .and_then(Value::as_str)
            .and_then(Category::from_label);

        match (index, category) {
            (Some(index), Some(category)) => {
                mapping.insert(index, category);
            }
            _ => rejected += 1,
        }
    }

    if rejected > 0 {
        tracing::debug!(rejected, "Discarded invalid categorization entries");
    }
    Ok(mapping)
}

/// Escape backslashes that don't start a valid JSON escape sequence
///
/// Statement narrations often contain Windows-style paths or stray `\` that
/// models copy through verbatim.
pub fn fix_invalid_escapes(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')) => {
                out.push('\\');
                out.push(next);
                chars.next();
            }
            _ => out.push_str("\\\\"),
        }
    }

    out
}

/// Amount field as a number (JSON number or numeric string like "1,250.00")
fn amount_of(entry: &Value) -> Option<f64> {
    match entry.get("amount")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s).ok(),
        _ => None,
    }
}

/// Parse a transaction extraction response into transactions
///
/// Entries need a non-empty `desc`, a `type` of Credit/Debit and a numeric
/// `amount`; anything else is skipped.
pub fn parse_extracted_transactions(response: &str) -> Result<Vec<NewTransaction>> {
    let array = fix_invalid_escapes(extract_json_array(response)?);
    let entries = parse_values(&array)?;

    let transactions: Vec<NewTransaction> = entries
        .iter()
        .filter_map(|entry| {
            let desc = entry.get("desc").and_then(Value::as_str)?.trim();
            if desc.is_empty() {
                return None;
            }
            let direction: Direction = entry.get("type").and_then(Value::as_str)?.parse().ok()?;
            let amount = amount_of(entry)?;
            Some(NewTransaction::new(desc, amount, direction))
        })
        .collect();

    if transactions.len() < entries.len() {
        tracing::debug!(
            skipped = entries.len() - transactions.len(),
            "Skipped incomplete extracted entries"
        );
    }
    Ok(transactions)
}
