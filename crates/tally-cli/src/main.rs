//! Tally CLI - Bank statement categorizer
//!
//! Usage:
//!   tally extract --file statement.pdf --password PW   Extract transactions
//!   tally categorize                                   Classify, verify, review
//!   tally report --top 5                               Summary and audit
//!   tally ai check                                     Test the model backend
//!   tally prompts show categorize_batch -i tx.json      Preview a batch prompt

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tally_core::PromptLibrary;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Extract {
            file,
            password,
            strategy,
            output,
            table_csv,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_extract(
                &config,
                &file,
                password.as_deref(),
                &strategy,
                &output,
                table_csv.as_deref(),
            )
            .await
        }
        Commands::Categorize {
            input,
            output,
            no_review,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_categorize(&config, &input, &output, no_review).await
        }
        Commands::Report { input, top, json } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_report(&input, top.unwrap_or(config.report.top_transactions), json)
        }
        Commands::Ai { action } => match action {
            AiAction::Check => {
                let config = commands::load_config(cli.config.as_deref())?;
                commands::cmd_ai_check(&config).await
            }
        },
        Commands::Prompts { action } => {
            let mut library = PromptLibrary::new();
            match action {
                None | Some(PromptsAction::List) => commands::cmd_prompts_list(&mut library),
                Some(PromptsAction::Show { prompt_id, input }) => {
                    commands::cmd_prompts_show(library, &prompt_id, input.as_deref())
                }
            }
        }
    }
}
