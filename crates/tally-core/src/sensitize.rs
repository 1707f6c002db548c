//! Digit masking for statement text
//!
//! Account numbers, card numbers and UPI references show up inside statement
//! narrations. Every maximal run of four or more digits is replaced with an
//! equal-length run of `*` before text is stored or sent to a model backend.

use std::sync::OnceLock;

use regex::Regex;

/// Character used to replace masked digits
pub const MASK_CHAR: char = '*';

/// Minimum run length that gets masked
pub const MIN_SENSITIVE_RUN: usize = 4;

fn digit_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4,}").expect("valid regex"))
}

/// Mask every run of 4+ consecutive digits in `text`
///
/// Idempotent: the output contains no digit runs of length 4 or more, so
/// masking it again changes nothing.
pub fn mask_digits(text: &str) -> String {
    digit_run_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let len = caps[0].chars().count();
            std::iter::repeat(MASK_CHAR).take(len).collect::<String>()
        })
        .into_owned()
}

/// Mask a batch of lines, preserving order
pub fn mask_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines.iter().map(|l| mask_digits(l.as_ref())).collect()
}

/// Whether `text` still contains a digit run that should have been masked
pub fn contains_sensitive_run(text: &str) -> bool {
    digit_run_re().is_match(text)
}
