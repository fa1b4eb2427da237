//! Row-level evaluation under a bounded admission gate.

use crate::compare::{business_metrics, datetimes_equal, field_matches, names_equal};
use crate::dataset::GroundTruthRow;
use crate::judge::ExtractionJudge;
use crate::result::EvalResult;
use crate::{EvalError, Result};
use bizmatch_core::MatchCandidate;
use bizmatch_extract::{format_timestamp, parse_reference, ExtractError, Extractor, MainFields};
use chrono::{DateTime, FixedOffset, Utc};
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFERENCE_TIME: &str = "2025-10-01T14:32:10Z";

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Rows allowed in flight at once
    pub concurrency: usize,
    /// Applied to each extraction group independently
    pub call_timeout: Duration,
    /// "Now" for relative datetime resolution and the datetime fallback
    pub reference_time: DateTime<FixedOffset>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            reference_time: DateTime::parse_from_rfc3339(DEFAULT_REFERENCE_TIME)
                .unwrap_or_else(|_| Utc::now().fixed_offset()),
        }
    }
}

impl EvalConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_reference_time(mut self, value: &str) -> Result<Self> {
        self.reference_time = parse_reference(value)
            .ok_or_else(|| EvalError::InvalidConfig(format!("invalid reference time: {value}")))?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(EvalError::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.call_timeout.is_zero() {
            return Err(EvalError::InvalidConfig("call timeout must be positive".into()));
        }
        Ok(())
    }
}

pub struct EvalOrchestrator {
    extractor: Extractor,
    judge: ExtractionJudge,
    config: EvalConfig,
}

impl EvalOrchestrator {
    pub fn new(extractor: Extractor, judge: ExtractionJudge, config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor,
            judge,
            config,
        })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate rows with the configured concurrency limit
    pub async fn run(&self, rows: &[GroundTruthRow]) -> Vec<EvalResult> {
        self.run_evaluation(rows, self.config.concurrency).await
    }

    /// Evaluate every row; `result[i]` belongs to `rows[i]`.
    ///
    /// At most `concurrency_limit` rows are admitted at once. Rows never
    /// fail as a whole: a failed call degrades only the fields it feeds.
    pub async fn run_evaluation(&self, rows: &[GroundTruthRow], concurrency_limit: usize) -> Vec<EvalResult> {
        let gate = Semaphore::new(concurrency_limit.max(1));
        info!(rows = rows.len(), concurrency = concurrency_limit, "Starting evaluation");

        let tasks = rows.iter().enumerate().map(|(index, row)| {
            let gate = &gate;
            async move {
                // The gate is never closed, so acquire cannot fail
                let _permit = gate.acquire().await.ok();
                debug!(row = index, "Row admitted");
                self.evaluate_row(row).await
            }
        });
        let results = join_all(tasks).await;

        info!(rows = results.len(), "Evaluation complete");
        results
    }

    /// Evaluate a single row without admission control
    pub async fn evaluate_row(&self, row: &GroundTruthRow) -> EvalResult {
        let text = row.input_text.as_str();
        let reference = &self.config.reference_time;

        let (main, datetime, business) = tokio::join!(
            self.timed(self.extractor.main_fields(text)),
            self.timed(self.extractor.datetime(text, reference)),
            self.timed(self.extractor.business(text)),
        );

        let main = main.unwrap_or_else(|e| {
            warn!(error = %e, "Main field extraction failed");
            MainFields::default()
        });
        let extracted_datetime = datetime.unwrap_or_else(|e| {
            warn!(error = %e, "Datetime extraction failed");
            format_timestamp(reference)
        });
        let candidates: Vec<MatchCandidate> = match business {
            Ok(extraction) => extraction.candidates.into_vec(),
            Err(e) => {
                warn!(error = %e, "Business extraction failed");
                Vec::new()
            }
        };

        let retrieval = business_metrics(&row.business, &candidates);
        let extracted_description = main.description.unwrap_or_default();
        let (best_candidate, description_matched) = tokio::join!(
            self.judge.pick_best_candidate(text, &candidates),
            self.judge
                .judge_description_equivalence(&row.description, &extracted_description),
        );

        let extracted_amount = main.amount.unwrap_or_default();
        let extracted_currency = main.currency.unwrap_or_default();

        EvalResult {
            input_text: row.input_text.clone(),
            expected_business: row.business.clone(),
            business_matched: retrieval.matched,
            business_candidates: retrieval.names,
            candidate_count: retrieval.candidate_count,
            business_score: retrieval.score,
            business_position: retrieval.position,
            best_candidate_matched: names_equal(&row.business, &best_candidate),
            best_candidate,
            expected_datetime: row.datetime.clone(),
            datetime_matched: datetimes_equal(&row.datetime, &extracted_datetime),
            extracted_datetime,
            expected_description: row.description.clone(),
            extracted_description,
            description_matched,
            expected_amount: row.amount.clone(),
            amount_matched: field_matches(&row.amount, &extracted_amount),
            extracted_amount,
            expected_currency: row.currency.clone(),
            currency_matched: field_matches(&row.currency, &extracted_currency),
            extracted_currency,
        }
    }

    async fn timed<T>(
        &self,
        call: impl Future<Output = bizmatch_extract::Result<T>>,
    ) -> bizmatch_extract::Result<T> {
        let limit = self.config.call_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(ExtractError::Timeout(limit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{BEST_MATCH_PROMPT, DESCRIPTION_JUDGE_PROMPT};
    use async_trait::async_trait;
    use bizmatch_core::{BusinessMatcher, CatalogSearch};
    use bizmatch_extract::{LanguageModel, PromptSet};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replies per extraction group; `None` fails the call
    #[derive(Default)]
    struct FakeModel {
        main: Option<String>,
        datetime: Option<String>,
        business: Option<String>,
        description_match: bool,
        best_match: Option<String>,
        judges_fail: bool,
        main_delay_ms: HashMap<String, u64>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeModel {
        fn reply(value: &Option<String>) -> bizmatch_extract::Result<String> {
            value
                .clone()
                .ok_or_else(|| ExtractError::Transport("connection reset".into()))
        }
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn complete(&self, system: &str, user: &str, _model: Option<&str>) -> bizmatch_extract::Result<String> {
            let prompts = PromptSet::default();
            if system == prompts.main {
                self.calls.lock().push("main");
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                let delay = self.main_delay_ms.get(user).copied().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Self::reply(&self.main)
            } else if system == prompts.business {
                self.calls.lock().push("business");
                Self::reply(&self.business)
            } else if system == DESCRIPTION_JUDGE_PROMPT {
                self.calls.lock().push("description");
                if self.judges_fail {
                    return Err(ExtractError::Transport("judge unavailable".into()));
                }
                Ok(format!(r#"{{"match": {}}}"#, self.description_match))
            } else if system == BEST_MATCH_PROMPT {
                self.calls.lock().push("best");
                Self::reply(&self.best_match).map(|b| format!(r#"{{"best_match": "{b}"}}"#))
            } else {
                self.calls.lock().push("datetime");
                Self::reply(&self.datetime)
            }
        }
    }

    struct FixedCatalog(Vec<MatchCandidate>);

    #[async_trait]
    impl CatalogSearch for FixedCatalog {
        async fn search(&self, _term: &str) -> bizmatch_core::Result<Vec<MatchCandidate>> {
            Ok(self.0.clone())
        }
    }

    fn coffee_shops() -> Vec<MatchCandidate> {
        vec![
            MatchCandidate::new(2u64, "Costa", 9.0),
            MatchCandidate::new(1u64, "Starbucks", 12.1),
        ]
    }

    fn build(model: FakeModel, catalog: Vec<MatchCandidate>, config: EvalConfig) -> (Arc<FakeModel>, EvalOrchestrator) {
        let llm = Arc::new(model);
        let matcher = BusinessMatcher::new(Arc::new(FixedCatalog(catalog)));
        let extractor = Extractor::new(llm.clone(), matcher);
        let judge = ExtractionJudge::new(llm.clone());
        let orchestrator = EvalOrchestrator::new(extractor, judge, config).unwrap();
        (llm, orchestrator)
    }

    fn happy_model() -> FakeModel {
        FakeModel {
            main: Some(r#"{"description": "лате", "amount": 150, "currency": "гривня"}"#.into()),
            datetime: Some(r#"{"time": "2025-10-01T14:32:10+00:00"}"#.into()),
            business: Some(r#"{"business": "Starbucks", "language": "en"}"#.into()),
            description_match: true,
            best_match: Some("starbucks".into()),
            ..Default::default()
        }
    }

    fn row(text: &str) -> GroundTruthRow {
        GroundTruthRow {
            input_text: text.into(),
            business: "Starbucks".into(),
            datetime: "2025-10-01T14:32:10Z".into(),
            description: "кава".into(),
            amount: String::new(),
            currency: "гривня".into(),
        }
    }

    #[tokio::test]
    async fn test_row_all_fields_matched() {
        let (llm, orchestrator) = build(happy_model(), coffee_shops(), EvalConfig::default());
        let result = orchestrator.evaluate_row(&row("лате в старбаксі за 150")).await;

        assert!(result.business_matched);
        assert_eq!(result.business_position, Some(1));
        assert_eq!(result.candidate_count, 2);
        assert_eq!(result.business_score, Some(12.1));
        assert_eq!(result.business_candidates, vec!["Starbucks", "Costa"]);
        assert_eq!(result.best_candidate, "starbucks");
        assert!(result.best_candidate_matched);
        assert!(result.datetime_matched);
        assert!(result.description_matched);
        assert_eq!(result.extracted_amount, "150");
        assert!(result.amount_matched);
        assert!(result.currency_matched);

        let calls = llm.calls.lock();
        for group in ["main", "datetime", "business", "best", "description"] {
            assert_eq!(calls.iter().filter(|c| **c == group).count(), 1, "{group}");
        }
    }

    #[tokio::test]
    async fn test_no_candidates_skips_best_match() {
        let (llm, orchestrator) = build(happy_model(), Vec::new(), EvalConfig::default());
        let result = orchestrator.evaluate_row(&row("кава")).await;

        assert!(!result.business_matched);
        assert_eq!(result.business_position, None);
        assert_eq!(result.candidate_count, 0);
        assert_eq!(result.best_candidate, "");
        assert!(!result.best_candidate_matched);
        assert!(!llm.calls.lock().contains(&"best"));
    }

    #[tokio::test]
    async fn test_failed_groups_degrade_fields() {
        let model = FakeModel {
            description_match: false,
            ..Default::default()
        };
        let (_, orchestrator) = build(model, coffee_shops(), EvalConfig::default());
        let mut expected = row("щось незрозуміле");
        expected.amount = "150".into();
        expected.currency = " ".into();

        let result = orchestrator.evaluate_row(&expected).await;
        assert_eq!(result.extracted_description, "");
        assert_eq!(result.extracted_amount, "");
        assert!(!result.amount_matched);
        assert!(result.currency_matched);
        assert!(!result.description_matched);
        assert_eq!(result.extracted_datetime, "2025-10-01T14:32:10+00:00");
        assert!(result.datetime_matched);
        assert!(!result.business_matched);
    }

    #[tokio::test]
    async fn test_timed_out_group_degrades() {
        let mut model = happy_model();
        model.main_delay_ms.insert("повільно".into(), 5_000);
        let config = EvalConfig::default().with_call_timeout(Duration::from_millis(50));
        let (_, orchestrator) = build(model, coffee_shops(), config);

        let result = orchestrator.evaluate_row(&row("повільно")).await;
        assert_eq!(result.extracted_description, "");
        assert!(result.amount_matched);
        assert!(result.business_matched);
    }

    #[tokio::test]
    async fn test_admission_gate_bounds_rows_and_keeps_order() {
        let mut model = happy_model();
        let rows: Vec<GroundTruthRow> = (0..12).map(|i| row(&format!("row {i}"))).collect();
        for (i, r) in rows.iter().enumerate() {
            model.main_delay_ms.insert(r.input_text.clone(), 5 * (12 - i as u64));
        }
        let (llm, orchestrator) = build(model, coffee_shops(), EvalConfig::default());

        let results = orchestrator.run_evaluation(&rows, 3).await;
        assert_eq!(llm.peak.load(Ordering::SeqCst), 3);
        assert_eq!(results.len(), rows.len());
        for (result, row) in results.iter().zip(&rows) {
            assert_eq!(result.input_text, row.input_text);
        }
    }

    #[tokio::test]
    async fn test_failing_rows_release_their_slot() {
        let model = FakeModel {
            judges_fail: true,
            ..Default::default()
        };
        let rows: Vec<GroundTruthRow> = (0..4).map(|i| row(&format!("row {i}"))).collect();
        let (llm, orchestrator) = build(model, coffee_shops(), EvalConfig::default());

        let results = tokio::time::timeout(Duration::from_secs(5), orchestrator.run_evaluation(&rows, 1))
            .await
            .expect("a failed row kept its slot");
        assert_eq!(results.len(), rows.len());
        for (result, row) in results.iter().zip(&rows) {
            assert_eq!(result.input_text, row.input_text);
            assert!(!result.business_matched);
            assert!(!result.description_matched);
            assert_eq!(result.extracted_description, "");
        }
        assert_eq!(llm.calls.lock().iter().filter(|c| **c == "main").count(), rows.len());
        assert_eq!(llm.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_uses_configured_limit() {
        let mut model = happy_model();
        let rows: Vec<GroundTruthRow> = (0..8).map(|i| row(&format!("row {i}"))).collect();
        for r in &rows {
            model.main_delay_ms.insert(r.input_text.clone(), 10);
        }
        let (llm, orchestrator) = build(model, coffee_shops(), EvalConfig::default());

        orchestrator.run(&rows).await;
        assert_eq!(llm.peak.load(Ordering::SeqCst), DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_config_validation() {
        assert!(EvalConfig::default().validate().is_ok());
        assert!(EvalConfig::default().with_concurrency(0).validate().is_err());
        assert!(EvalConfig::default().with_reference_time("yesterday").is_err());

        let config = EvalConfig::default()
            .with_reference_time("2025-03-01T09:00:00+02:00")
            .unwrap();
        assert_eq!(format_timestamp(&config.reference_time), "2025-03-01T09:00:00+02:00");
    }
}
