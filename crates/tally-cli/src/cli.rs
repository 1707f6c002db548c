//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Categorize bank statement transactions
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Bank statement extractor and spending categorizer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the user config, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract transactions from a statement (PDF or text)
    Extract {
        /// Statement file (.pdf, anything else is read as text)
        #[arg(short, long)]
        file: PathBuf,

        /// Password for an encrypted PDF
        #[arg(short, long)]
        password: Option<String>,

        /// Parse strategy: table, lines, remote
        #[arg(short, long, default_value = "table")]
        strategy: String,

        /// Where to write the extracted transactions
        #[arg(short, long, default_value = "transactions.json")]
        output: PathBuf,

        /// Also dump the detected table as CSV (table strategy only)
        #[arg(long)]
        table_csv: Option<PathBuf>,
    },

    /// Categorize extracted transactions, auto-verify, then review the rest
    Categorize {
        /// Extracted transactions
        #[arg(short, long, default_value = "transactions.json")]
        input: PathBuf,

        /// Where to write the categorized transactions
        #[arg(short, long, default_value = "categorized.json")]
        output: PathBuf,

        /// Skip interactive review (ambiguous transactions stay unverified)
        #[arg(long)]
        no_review: bool,
    },

    /// Show the category report and miscategorization audit
    Report {
        /// Categorized transactions
        #[arg(short, long, default_value = "categorized.json")]
        input: PathBuf,

        /// Top transactions to list per category (defaults to config)
        #[arg(short, long)]
        top: Option<usize>,

        /// Output the summary and audit as JSON
        #[arg(long)]
        json: bool,
    },

    /// Model backend commands
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },

    /// Inspect prompt templates and overrides
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Check that the configured backend is reachable
    Check,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List prompts, their variables and override files
    List,

    /// Print a prompt template, or render it against real input
    Show {
        /// categorize_batch or extract_transactions
        prompt_id: String,

        /// Extracted transactions (categorize_batch) or a statement file
        /// (extract_transactions) to render the prompt with
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}
