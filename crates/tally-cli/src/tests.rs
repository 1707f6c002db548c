//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};

use tally_core::{
    load_categorized, load_transactions, save_categorized, AiConfig, BackendKind, Category,
    Config, Direction, NewTransaction, PromptId, PromptLibrary, ScriptedInput, Transaction,
};
use tempfile::TempDir;

use crate::commands::{self, truncate};

const STATEMENT: &str = "\
Statement of account
Account No : 50100123456789

Date   Narration   Amount   Type
01-03-2024  SALARY CREDIT ACME CORP 85,000.00  Credit
02-03-2024  SWIGGY ORDER 450.00  Debit
03-03-2024  IMPS 445566778899 RAVI 1,200.00  Debit
Page 1 of 1
";

fn write_statement(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("statement.txt");
    std::fs::write(&path, STATEMENT).unwrap();
    path
}

fn mock_config() -> Config {
    Config {
        ai: AiConfig {
            backend: BackendKind::Mock,
            ..AiConfig::default()
        },
        ..Config::default()
    }
}

fn write_extracted(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("transactions.json");
    let transactions = vec![
        NewTransaction::new("SWIGGY ORDER", 450.0, Direction::Debit),
        NewTransaction::new("IMPS RAVI", 1200.0, Direction::Debit),
        NewTransaction::new("NEFT REF", 300.0, Direction::Debit),
    ];
    tally_core::save_transactions(&path, &transactions).unwrap();
    path
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long description", 10), "a long ...");
    assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
}

#[test]
fn test_load_config_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tally.toml");
    std::fs::write(&path, "[report]\ntop_transactions = 7\n").unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.report.top_transactions, 7);
    assert_eq!(config.source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_load_config_missing_file() {
    assert!(commands::load_config(Some(Path::new("/nonexistent/tally.toml"))).is_err());
}

// ========== Extract Command Tests ==========

#[tokio::test]
async fn test_cmd_extract_table_with_csv() {
    let dir = TempDir::new().unwrap();
    let statement = write_statement(&dir);
    let output = dir.path().join("transactions.json");
    let csv_path = dir.path().join("table.csv");

    commands::cmd_extract(
        &Config::default(),
        &statement,
        None,
        "table",
        &output,
        Some(&csv_path),
    )
    .await
    .unwrap();

    let transactions = load_transactions(&output).unwrap();
    assert_eq!(transactions.len(), 3);
    assert_eq!(transactions[0].direction, Direction::Credit);
    assert_eq!(transactions[2].description, "IMPS ************ RAVI");

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("Date,Narration,Amount,Type"));
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test]
async fn test_cmd_extract_lines() {
    let dir = TempDir::new().unwrap();
    let statement = write_statement(&dir);
    let output = dir.path().join("transactions.json");

    commands::cmd_extract(&Config::default(), &statement, None, "lines", &output, None)
        .await
        .unwrap();

    let transactions = load_transactions(&output).unwrap();
    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![85000.0, 450.0, 1200.0]);
}

#[tokio::test]
async fn test_cmd_extract_schema_not_detected_suggests_lines() {
    let dir = TempDir::new().unwrap();
    let statement = dir.path().join("statement.txt");
    std::fs::write(&statement, "12/03/24 SWIGGY FOOD ORDER 450.00\n").unwrap();
    let output = dir.path().join("transactions.json");

    let err = commands::cmd_extract(&Config::default(), &statement, None, "table", &output, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("--strategy lines"));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_cmd_extract_remote_needs_backend() {
    let dir = TempDir::new().unwrap();
    let statement = write_statement(&dir);
    let output = dir.path().join("transactions.json");

    let result =
        commands::cmd_extract(&Config::default(), &statement, None, "remote", &output, None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_extract_unknown_strategy() {
    let dir = TempDir::new().unwrap();
    let statement = write_statement(&dir);
    let output = dir.path().join("transactions.json");

    let result =
        commands::cmd_extract(&Config::default(), &statement, None, "guess", &output, None).await;
    assert!(result.is_err());
}

// ========== Categorize Command Tests ==========

#[tokio::test]
async fn test_categorize_without_review() {
    let dir = TempDir::new().unwrap();
    let input = write_extracted(&dir);
    let output = dir.path().join("categorized.json");

    commands::categorize_file(&mock_config(), &input, &output, None)
        .await
        .unwrap();

    let categorized = load_categorized(&output).unwrap();
    assert_eq!(categorized.len(), 3);
    assert_eq!(categorized[0].category(), Category::Food);
    assert!(categorized[0].is_verified());
    assert!(!categorized[1].is_verified());
    assert!(!categorized[2].is_verified());
}

#[tokio::test]
async fn test_categorize_with_scripted_review() {
    let dir = TempDir::new().unwrap();
    let input = write_extracted(&dir);
    let output = dir.path().join("categorized.json");
    let mut review = ScriptedInput::new(["n", "Bills", "s"]);

    commands::categorize_file(&Config::default(), &input, &output, Some(&mut review))
        .await
        .unwrap();

    let categorized = load_categorized(&output).unwrap();
    assert_eq!(categorized[1].category(), Category::Bills);
    assert!(categorized[1].is_verified());
    assert_eq!(categorized[2].category(), Category::Other);
    assert!(!categorized[2].is_verified());
}

#[tokio::test]
async fn test_categorize_missing_input() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("categorized.json");
    let result = commands::categorize_file(
        &Config::default(),
        &dir.path().join("missing.json"),
        &output,
        None,
    )
    .await;
    assert!(result.is_err());
}

// ========== Report Command Tests ==========

#[test]
fn test_cmd_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("categorized.json");
    let transactions = vec![Transaction::categorized(
        NewTransaction::new("SWIGGY", 450.0, Direction::Debit),
        Category::Travel,
    )];
    save_categorized(&path, &transactions).unwrap();

    assert!(commands::cmd_report(&path, 3, false).is_ok());
    assert!(commands::cmd_report(&path, 3, true).is_ok());
}

#[test]
fn test_cmd_report_empty_and_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("categorized.json");
    save_categorized(&path, &[]).unwrap();
    assert!(commands::cmd_report(&path, 3, false).is_ok());

    assert!(commands::cmd_report(&dir.path().join("missing.json"), 3, false).is_err());
}

// ========== AI Command Tests ==========

#[tokio::test]
async fn test_cmd_ai_check_without_backend() {
    assert!(commands::cmd_ai_check(&Config::default()).await.is_ok());
}

#[tokio::test]
async fn test_cmd_ai_check_mock() {
    assert!(commands::cmd_ai_check(&mock_config()).await.is_ok());
}

// ========== Prompts Command Tests ==========

#[test]
fn test_cmd_prompts_list_with_override() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("categorize_batch.md"),
        "---\nid: categorize_batch\nversion: 2\ntask: categorization\n---\nSort: {{transactions}}",
    )
    .unwrap();

    let mut library = PromptLibrary::with_override_dir(dir.path().to_path_buf());
    assert!(commands::cmd_prompts_list(&mut library).is_ok());
}

#[test]
fn test_render_prompt_template() {
    let template =
        commands::render_prompt(PromptLibrary::embedded_only(), PromptId::CategorizeBatch, None)
            .unwrap();
    assert!(template.contains("{{transactions}}"));
}

#[test]
fn test_render_prompt_batch_preview() {
    let dir = TempDir::new().unwrap();
    let input = write_extracted(&dir);

    let prompt = commands::render_prompt(
        PromptLibrary::embedded_only(),
        PromptId::CategorizeBatch,
        Some(&input),
    )
    .unwrap();
    assert!(prompt.contains("1. SWIGGY ORDER | Amount: 450.00 | Type: Debit"));
    assert!(prompt.contains("3. NEFT REF | Amount: 300.00 | Type: Debit"));
    assert!(prompt.contains(&Category::list()));
    assert!(!prompt.contains("{{"));
}

#[test]
fn test_render_prompt_extraction_preview_is_masked() {
    let dir = TempDir::new().unwrap();
    let statement = write_statement(&dir);

    let prompt = commands::render_prompt(
        PromptLibrary::embedded_only(),
        PromptId::ExtractTransactions,
        Some(&statement),
    )
    .unwrap();
    assert!(prompt.contains("SWIGGY ORDER 450.00"));
    assert!(!prompt.contains("50100123456789"));
    assert!(!prompt.contains("445566778899"));
}

#[test]
fn test_render_prompt_missing_input() {
    let dir = TempDir::new().unwrap();
    let result = commands::render_prompt(
        PromptLibrary::embedded_only(),
        PromptId::CategorizeBatch,
        Some(&dir.path().join("missing.json")),
    );
    assert!(result.is_err());
}

#[test]
fn test_cmd_prompts_show_unknown_id() {
    let err = commands::cmd_prompts_show(PromptLibrary::embedded_only(), "nonexistent", None)
        .unwrap_err();
    assert!(err.to_string().contains("categorize_batch"));

    let shown =
        commands::cmd_prompts_show(PromptLibrary::embedded_only(), "extract_transactions", None);
    assert!(shown.is_ok());
}
