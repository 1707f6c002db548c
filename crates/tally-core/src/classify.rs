//! Batch categorization
//!
//! One request per batch goes to the model backend. Whatever it returns is
//! filtered down to valid `(index, category)` pairs; every transaction the
//! model didn't place (or the whole batch, if the call failed) gets a
//! category from the keyword rules instead.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::ai::parsing::parse_categorizations;
use crate::ai::{AIBackend, AIClient};
use crate::config::Config;
use crate::error::Result;
use crate::models::{Category, NewTransaction, Transaction};
use crate::prompts::{PromptId, PromptLibrary};
use crate::rules::fallback_category;
use crate::sensitize::mask_digits;

/// Result of categorizing a batch
#[derive(Debug, Clone)]
pub struct Categorization {
    /// Same order and length as the input
    pub transactions: Vec<Transaction>,
    /// Categories taken from the model
    pub by_remote: usize,
    /// Categories taken from the keyword rules
    pub by_fallback: usize,
    /// Why the remote call produced nothing, if it failed outright
    pub remote_error: Option<String>,
}

/// Assigns a category to every transaction in a batch
pub struct Classifier {
    client: Option<AIClient>,
    prompts: PromptLibrary,
}

impl Classifier {
    /// Classifier with an explicit backend (`None` = keyword rules only)
    pub fn new(client: Option<AIClient>, prompts: PromptLibrary) -> Self {
        Self { client, prompts }
    }

    /// Classifier using the configured backend and default prompt library
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            AIClient::from_config(&config.ai)?,
            PromptLibrary::new(),
        ))
    }

    /// Keyword rules only
    pub fn rules_only() -> Self {
        Self::new(None, PromptLibrary::embedded_only())
    }

    pub fn client(&self) -> Option<&AIClient> {
        self.client.as_ref()
    }

    /// Categorize every transaction; never fails
    ///
    /// Remote failures are logged once and the batch falls back to rules.
    pub async fn categorize(&mut self, batch: Vec<NewTransaction>) -> Categorization {
        let (mapping, remote_error) = match self.request_categories(&batch).await {
            Ok(mapping) => (mapping, None),
            Err(e) => {
                warn!(
                    transactions = batch.len(),
                    "Remote categorization failed, using keyword rules for the batch: {}", e
                );
                (HashMap::new(), Some(e.to_string()))
            }
        };

        let mut by_remote = 0;
        let mut by_fallback = 0;
        let transactions: Vec<Transaction> = batch
            .into_iter()
            .enumerate()
            .map(|(i, tx)| {
                let category = match mapping.get(&(i + 1)) {
                    Some(&category) => {
                        by_remote += 1;
                        category
                    }
                    None => {
                        by_fallback += 1;
                        fallback_category(&tx.description, tx.direction, tx.amount)
                    }
                };
                Transaction::categorized(tx, category)
            })
            .collect();

        info!(
            total = transactions.len(),
            by_remote, by_fallback, "Categorized transactions"
        );

        Categorization {
            transactions,
            by_remote,
            by_fallback,
            remote_error,
        }
    }

    /// The categorization prompt for `batch`, exactly as it would be sent
    pub fn batch_prompt(&mut self, batch: &[NewTransaction]) -> Result<String> {
        let listing = render_batch(batch);
        let count = batch.len().to_string();
        let categories = Category::list();
        let vars = HashMap::from([
            ("categories", categories.as_str()),
            ("count", count.as_str()),
            ("transactions", listing.as_str()),
        ]);
        self.prompts.render(PromptId::CategorizeBatch, &vars)
    }

    /// One bulk request for the whole batch
    ///
    /// No client or an empty batch means no request and an empty mapping.
    async fn request_categories(
        &mut self,
        batch: &[NewTransaction],
    ) -> Result<HashMap<usize, Category>> {
        if self.client.is_none() {
            debug!("No model backend configured, using keyword rules");
            return Ok(HashMap::new());
        }
        if batch.is_empty() {
            return Ok(HashMap::new());
        }

        let prompt = self.batch_prompt(batch)?;
        let Some(client) = self.client.as_ref() else {
            return Ok(HashMap::new());
        };

        debug!(
            transactions = batch.len(),
            host = client.host(),
            model = client.model(),
            "Requesting batch categorization"
        );
        let response = client.complete(&prompt).await?;
        let mapping = parse_categorizations(&response, batch.len())?;
        debug!(mapped = mapping.len(), "Parsed remote categories");
        Ok(mapping)
    }
}

/// One line per transaction: `{index}. {desc} | Amount: {amount} | Type: {direction}`
fn render_batch(batch: &[NewTransaction]) -> String {
    batch
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            format!(
                "{}. {} | Amount: {:.2} | Type: {}",
                i + 1,
                mask_digits(&tx.description),
                tx.amount,
                tx.direction
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
