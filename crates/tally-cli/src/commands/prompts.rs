//! Prompt templates: what they expect and what they render to

use std::path::Path;

use anyhow::{bail, Context, Result};
use tally_core::{
    extraction_prompt, load_transactions, source::source_for_path, Classifier, PromptId,
    PromptLibrary,
};

/// List prompts with their variables and where each one is loaded from
pub fn cmd_prompts_list(library: &mut PromptLibrary) -> Result<()> {
    println!("{:<22} {:<16} {:<34} SOURCE", "ID", "TASK", "VARIABLES");
    for info in library.list() {
        let source = match &info.override_path {
            Some(path) => path.display().to_string(),
            None => "built-in".to_string(),
        };
        println!(
            "{:<22} {:<16} {:<34} {}",
            info.id,
            format!("{} v{}", info.task, info.version),
            info.variables.join(", "),
            source
        );
        if !info.missing_variables.is_empty() {
            println!(
                "  ! override never uses {}; that data will not reach the model",
                info.missing_variables.join(", ")
            );
        }
    }

    match library.override_dir() {
        Some(dir) if dir.exists() => println!("\nOverrides: {}", dir.display()),
        Some(dir) => println!("\nOverrides: {} (not created yet)", dir.display()),
        None => println!("\nOverrides: unavailable on this system"),
    }
    Ok(())
}

/// Print a prompt template, or render it against `input`
pub fn cmd_prompts_show(
    library: PromptLibrary,
    prompt_id: &str,
    input: Option<&Path>,
) -> Result<()> {
    let Some(id) = PromptId::from_name(prompt_id) else {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        bail!("Unknown prompt '{}' (known: {})", prompt_id, known.join(", "));
    };

    println!("{}", render_prompt(library, id, input)?);
    Ok(())
}

/// The template itself, or with `input` the exact text the model would get
///
/// `categorize_batch` reads extracted transactions (JSON); `extract_transactions`
/// reads a statement file.
pub fn render_prompt(
    mut library: PromptLibrary,
    id: PromptId,
    input: Option<&Path>,
) -> Result<String> {
    let Some(input) = input else {
        return Ok(library.get(id)?.content.clone());
    };

    match id {
        PromptId::CategorizeBatch => {
            let transactions = load_transactions(input)
                .with_context(|| format!("Failed to read transactions: {}", input.display()))?;
            Ok(Classifier::new(None, library).batch_prompt(&transactions)?)
        }
        PromptId::ExtractTransactions => {
            let text = source_for_path(input)
                .read_lines(None)
                .with_context(|| format!("Failed to read statement: {}", input.display()))?;
            extraction_prompt(&mut library, &text.lines)?
                .with_context(|| format!("No statement text in {}", input.display()))
        }
    }
}
