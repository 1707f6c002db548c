//! Integration tests for tally-core
//!
//! These tests exercise the full lines → parse → categorize → verify → report
//! workflow against a mock model backend.

use tally_core::{
    auto_verify, find_miscategorized, load_categorized, parse_lines, parse_table, render_report,
    review, review_ambiguous, save_categorized, summarize, AIClient, Category, Classifier,
    Direction, MockBackend, NewTransaction, PromptLibrary, ScriptedInput,
};
use tally_core::sensitize::contains_sensitive_run;

/// Statement text as it comes out of a PDF page, header included
fn statement_lines() -> Vec<&'static str> {
    vec![
        "HDFC BANK LTD   Statement of account",
        "Account No : 50100123456789",
        "",
        "Date   Narration   Amount   Type",
        "01-03-2024  SALARY CREDIT ACME CORP 85,000.00  Credit",
        "02-03-2024  SWIGGY ORDER 450.00  Debit",
        "03-03-2024  UBER TRIP 312.50  Debit",
        "05-03-2024  NETFLIX SUBSCRIPTION 649.00  Debit",
        "07-03-2024  UPI/918877665544/RAVI 1,200.00  Debit",
        "Page 1 of 1",
    ]
}

fn mock_classifier(response: &str) -> (Classifier, MockBackend) {
    let backend = MockBackend::with_response(response);
    let classifier = Classifier::new(
        Some(AIClient::Mock(backend.clone())),
        PromptLibrary::embedded_only(),
    );
    (classifier, backend)
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_table_and_line_strategies_agree_on_amounts() {
    let table = parse_table(&statement_lines()).expect("header detected");
    assert_eq!(table.headers, vec!["Date", "Narration", "Amount", "Type"]);
    assert_eq!(table.rows.len(), 5);
    assert_eq!(
        table.rows[1],
        vec!["02-03-2024", "SWIGGY ORDER 450.00", "Debit", ""]
    );

    let from_table = table.to_transactions();
    let from_lines = parse_lines(&statement_lines());
    assert_eq!(from_table.len(), 5);
    assert_eq!(from_lines.len(), 5);

    let amounts = |txs: &[NewTransaction]| txs.iter().map(|t| t.amount).collect::<Vec<_>>();
    assert_eq!(amounts(&from_table), amounts(&from_lines));
    assert_eq!(from_table[0].direction, Direction::Credit);
    assert_eq!(from_table[1].description, "SWIGGY ORDER");
}

#[test]
fn test_account_numbers_never_survive_parsing() {
    for tx in parse_table(&statement_lines()).unwrap().to_transactions() {
        assert!(
            !contains_sensitive_run(&tx.description),
            "unmasked digits in {:?}",
            tx.description
        );
    }
}

#[test]
fn test_line_strategy_currency_and_short_year() {
    let txs = parse_lines(&["12/03/24 SWIGGY FOOD ORDER ₹450.00"]);
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].description, "SWIGGY FOOD ORDER");
    assert_eq!(txs[0].amount, 450.0);
    assert_eq!(txs[0].direction, Direction::Debit);
}

// =============================================================================
// Full pipeline
// =============================================================================

#[tokio::test]
async fn test_full_pipeline_with_remote_categories() {
    let parsed = parse_table(&statement_lines()).unwrap().to_transactions();
    let (mut classifier, backend) = mock_classifier(
        r#"Here you go:
[{"index": 1, "category": "Income"},
 {"index": 2, "category": "Food"},
 {"index": 3, "category": "Travel"},
 {"index": 4, "category": "Entertainment"},
 {"index": 5, "category": "Other"}]"#,
    );

    let mut result = classifier.categorize(parsed).await;
    assert_eq!(backend.call_count(), 1);
    assert_eq!(result.by_remote, 5);
    assert_eq!(result.by_fallback, 0);
    assert!(result.remote_error.is_none());

    // nothing sent to the model carries a long digit run
    let prompt = &backend.prompts()[0];
    assert!(!prompt.contains("918877665544"));
    assert!(prompt.contains("UPI/************/RAVI"));

    // the UPI transfer is the only one left for review; confirm it
    let mut input = ScriptedInput::new(["y"]);
    let verification = review(&mut result.transactions, &mut input);
    assert_eq!(verification.auto_verified, 4);
    assert_eq!(verification.review.confirmed, 1);
    assert!(result.transactions.iter().all(|t| t.is_verified()));

    let summary = summarize(&result.transactions);
    assert_eq!(summary.categories[0].category, Category::Income);
    assert_eq!(summary.verification_rate(), 100.0);

    let report = render_report(&result.transactions, 3);
    assert!(report.contains("Transactions: 5"));
    assert!(report.contains("No likely miscategorizations found."));
}

fn mixed_batch() -> Vec<NewTransaction> {
    vec![
        NewTransaction::new("ZOMATO ORDER", 320.0, Direction::Debit),
        NewTransaction::new("UBER TRIP", 180.0, Direction::Debit),
        NewTransaction::new("AMAZON PAY", 999.0, Direction::Debit),
        NewTransaction::new("NEFT FROM EMPLOYER", 60000.0, Direction::Credit),
        NewTransaction::new("ATM WITHDRAWAL", 2000.0, Direction::Debit),
    ]
}

#[tokio::test]
async fn test_broken_json_falls_back_for_whole_batch() {
    let (mut classifier, backend) =
        mock_classifier(r#"Here you go: [{"index": 1, "category": }, {"index""#);

    let result = classifier.categorize(mixed_batch()).await;

    assert_eq!(backend.call_count(), 1);
    assert_eq!(result.by_remote, 0);
    assert_eq!(result.by_fallback, 5);
    assert!(result.remote_error.is_some());
    assert_eq!(result.transactions.len(), 5);
    assert_eq!(result.transactions[0].category(), Category::Food);
    assert_eq!(result.transactions[3].category(), Category::Income);
}

#[tokio::test]
async fn test_malformed_response_falls_back_for_whole_batch() {
    let (mut classifier, backend) = mock_classifier("Sorry, I can't help with that.");

    let result = classifier.categorize(mixed_batch()).await;

    assert_eq!(backend.call_count(), 1);
    assert_eq!(result.by_remote, 0);
    assert_eq!(result.by_fallback, 5);
    assert!(result.remote_error.is_some());

    let categories: Vec<Category> = result.transactions.iter().map(|t| t.category()).collect();
    assert_eq!(
        categories,
        vec![
            Category::Food,
            Category::Travel,
            Category::Shopping,
            Category::Income,
            Category::Other,
        ]
    );
}

#[tokio::test]
async fn test_invalid_labels_fall_back_per_transaction() {
    let batch = vec![
        NewTransaction::new("SWIGGY", 250.0, Direction::Debit),
        NewTransaction::new("RENTOMOJO", 1500.0, Direction::Debit),
    ];
    let (mut classifier, _) = mock_classifier(
        r#"[{"index": 1, "category": "Groceries"}, {"index": 2, "category": "Bills"}]"#,
    );

    let result = classifier.categorize(batch).await;
    assert_eq!(result.by_remote, 1);
    assert_eq!(result.transactions[0].category(), Category::Food);
    assert_eq!(result.transactions[1].category(), Category::Bills);
}

#[tokio::test]
async fn test_wrong_remote_category_is_left_for_review_and_audited() {
    let batch = vec![NewTransaction::new(
        "SWIGGY FOOD ORDER",
        450.0,
        Direction::Debit,
    )];
    let (mut classifier, _) = mock_classifier(r#"[{"index": 1, "category": "Travel"}]"#);

    let mut result = classifier.categorize(batch).await;
    assert_eq!(result.transactions[0].category(), Category::Travel);

    assert_eq!(auto_verify(&mut result.transactions), 0);
    assert!(!result.transactions[0].is_verified());

    let flagged = find_miscategorized(&result.transactions);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].current, Category::Travel);
    assert_eq!(flagged[0].suggested, Category::Food);
}

#[tokio::test]
async fn test_remote_failure_still_categorizes_everything() {
    let batch = vec![
        NewTransaction::new("JIO RECHARGE", 239.0, Direction::Debit),
        NewTransaction::new("SMS CHARGES", 17.7, Direction::Debit),
    ];
    let backend = MockBackend::failing();
    let mut classifier = Classifier::new(
        Some(AIClient::Mock(backend.clone())),
        PromptLibrary::embedded_only(),
    );

    let result = classifier.categorize(batch).await;
    assert_eq!(backend.call_count(), 1);
    assert_eq!(result.by_fallback, 2);
    assert_eq!(result.transactions[0].category(), Category::Entertainment);
    assert_eq!(result.transactions[1].category(), Category::Bills);
}

// =============================================================================
// Review
// =============================================================================

#[tokio::test]
async fn test_skip_on_second_of_five_ambiguous() {
    let batch: Vec<NewTransaction> = (1..=5)
        .map(|i| NewTransaction::new(&format!("IMPS REF {}", i), 100.0 * i as f64, Direction::Debit))
        .collect();
    let mut result = Classifier::rules_only().categorize(batch).await;
    assert_eq!(auto_verify(&mut result.transactions), 0);

    let mut input = ScriptedInput::new(["n", "food", "s", "y", "y"]);
    let outcome = review_ambiguous(&mut result.transactions, &mut input);

    assert_eq!(outcome.corrections, 1);
    assert_eq!(outcome.reviewed, 1);
    assert_eq!(outcome.skipped, 4);
    assert_eq!(input.remaining(), 2);

    assert!(result.transactions[0].is_verified());
    assert_eq!(result.transactions[0].category(), Category::Food);
    assert!(result.transactions[1..].iter().all(|t| !t.is_verified()));
    assert!(result.transactions[1..]
        .iter()
        .all(|t| t.category() == Category::Other));
}

#[tokio::test]
async fn test_categorized_list_survives_save_and_load() {
    let batch = vec![
        NewTransaction::new("NETFLIX", 649.0, Direction::Debit),
        NewTransaction::new("SOMETHING ELSE", 10.0, Direction::Debit),
    ];
    let mut result = Classifier::rules_only().categorize(batch).await;
    auto_verify(&mut result.transactions);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("categorized.json");
    save_categorized(&path, &result.transactions).unwrap();

    let loaded = load_categorized(&path).unwrap();
    assert_eq!(loaded, result.transactions);
    assert!(loaded[0].is_verified());
    assert!(!loaded[1].is_verified());
}
