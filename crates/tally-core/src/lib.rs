//! Tally Core Library
//!
//! Bank-statement pipeline for the Tally categorizer:
//! - Digit masking for anything stored or sent out
//! - Statement sources (encrypted PDF, pre-extracted text)
//! - Line parsers (header-anchored table, per-line regex, model extraction)
//! - Batch categorization with keyword-rule fallback
//! - Auto-verification and interactive review
//! - Category summaries and miscategorization audit
//! - Pluggable model backends (Gemini, Ollama, OpenAI-compatible)
//! - Prompt library and configuration

pub mod ai;
pub mod classify;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod prompts;
pub mod report;
pub mod rules;
pub mod sensitize;
pub mod source;
pub mod store;
pub mod verify;

/// Test utilities including mock model server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, GeminiBackend, MockBackend, OllamaBackend, OpenAICompatibleBackend,
};
pub use classify::{Categorization, Classifier};
pub use config::{AiConfig, BackendKind, Config, ReportConfig};
pub use error::{Error, Result};
pub use import::{
    extract, extraction_prompt, parse_lines, parse_table, ParseStrategy, StatementTable,
};
pub use models::{Category, Direction, NewTransaction, Transaction};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use report::{
    find_miscategorized, render_report, summarize, CategorySummary, Miscategorization, Summary,
};
pub use sensitize::mask_digits;
pub use source::{Decryption, PdfSource, SourceText, StatementSource, TextFileSource};
pub use store::{load_categorized, load_transactions, save_categorized, save_transactions};
pub use verify::{
    auto_verify, review, review_ambiguous, ConsoleInput, ReviewInput, ReviewOutcome,
    ScriptedInput, Verification,
};
