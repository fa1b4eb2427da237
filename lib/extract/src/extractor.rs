use crate::business::{resolve_business, BusinessExtraction};
use crate::datetime::{format_timestamp, resolve_datetime};
use crate::llm::LanguageModel;
use crate::prompts::PromptSet;
use crate::schema::MainFields;
use crate::Result;
use bizmatch_core::{BusinessMatcher, MatchCandidate};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Currency assumed when the model names none
pub const DEFAULT_CURRENCY: &str = "гривня";

/// Validated, merged result of all extraction groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDraft {
    pub amount: f64,
    pub currency: String,
    pub datetime: String,
    pub description: String,
    pub business: Option<String>,
    pub businesses: Vec<MatchCandidate>,
}

/// Runs the extraction groups for one transcribed text.
///
/// Transport failures surface as `Err` from the per-group calls; malformed
/// responses are absorbed into defaults.
#[derive(Clone)]
pub struct Extractor {
    llm: Arc<dyn LanguageModel>,
    matcher: BusinessMatcher,
    prompts: Arc<PromptSet>,
    model: Option<String>,
}

impl Extractor {
    pub fn new(llm: Arc<dyn LanguageModel>, matcher: BusinessMatcher) -> Self {
        Self {
            llm,
            matcher,
            prompts: Arc::new(PromptSet::default()),
            model: None,
        }
    }

    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = Arc::new(prompts);
        self
    }

    /// Model hint for the extraction calls; the client default otherwise
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub async fn main_fields(&self, text: &str) -> Result<MainFields> {
        let response = self
            .llm
            .complete(&self.prompts.main, text, self.model.as_deref())
            .await?;
        debug!(response = %response, "Main response");
        Ok(MainFields::from_response(&response))
    }

    pub async fn datetime(&self, text: &str, reference: &DateTime<FixedOffset>) -> Result<String> {
        let system = self.prompts.datetime(reference);
        let response = self.llm.complete(&system, text, self.model.as_deref()).await?;
        debug!(response = %response, "Datetime response");
        Ok(resolve_datetime(&response, reference))
    }

    pub async fn business(&self, text: &str) -> Result<BusinessExtraction> {
        let response = self
            .llm
            .complete(&self.prompts.business, text, self.model.as_deref())
            .await?;
        debug!(response = %response, "Business response");
        Ok(resolve_business(&response, &self.matcher).await)
    }

    /// Run all groups concurrently and merge them into a validated draft.
    /// A failed group leaves its fields at their defaults.
    pub async fn extract(&self, text: &str, reference: &DateTime<FixedOffset>) -> TransactionDraft {
        let (main, datetime, business) = tokio::join!(
            self.main_fields(text),
            self.datetime(text, reference),
            self.business(text),
        );

        let main = main.unwrap_or_else(|e| {
            warn!(error = %e, "Main extraction failed");
            MainFields::default()
        });
        let datetime = datetime.unwrap_or_else(|e| {
            warn!(error = %e, "Datetime extraction failed");
            format_timestamp(reference)
        });
        let business = business.unwrap_or_else(|e| {
            warn!(error = %e, "Business extraction failed");
            BusinessExtraction::default()
        });

        TransactionDraft {
            amount: main
                .amount_value()
                .filter(|a| a.is_finite() && *a > 0.0)
                .unwrap_or(0.0),
            currency: main.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            datetime,
            description: main.description.unwrap_or_default(),
            business: business.mention,
            businesses: business.candidates.into_vec(),
        }
    }
}
