//! Language-model judgments for fields that exact comparison cannot settle.
//!
//! Every judgment fails closed: a transport error, timeout, or a response
//! outside the expected schema counts as "not matched".

use bizmatch_core::MatchCandidate;
use bizmatch_extract::{schema::parse_object, LanguageModel, DEFAULT_JUDGE_MODEL};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DESCRIPTION_JUDGE_PROMPT: &str = "You assess transaction descriptions written in \
Ukrainian. The user sends a JSON object with a ground_truth and a predicted description. Decide \
whether both describe the same purchase. Wording may differ and a partial overlap of context \
counts as a match; different numbers usually mean a different context. Return ONLY a JSON \
object: {\"match\": true|false}";

pub const BEST_MATCH_PROMPT: &str = "You pick the business a transcribed voice note refers to. \
The user sends a JSON object with input_text and business_list, a pre-filtered list of likely \
candidates. Compare meaning, context and how the names sound; spoken names are often distorted. \
Return ONLY a JSON object: {\"best_match\": \"business name\"} using a name from the list, or \
{\"best_match\": \"\"} when none fits.";

const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct MatchVerdict {
    #[serde(rename = "match")]
    is_match: bool,
}

#[derive(Debug, Deserialize)]
struct BestMatch {
    best_match: String,
}

/// Judge backed by a (usually stronger) language model
#[derive(Clone)]
pub struct ExtractionJudge {
    llm: Arc<dyn LanguageModel>,
    model: String,
    timeout: Duration,
}

impl ExtractionJudge {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            model: DEFAULT_JUDGE_MODEL.to_string(),
            timeout: DEFAULT_JUDGE_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the predicted description carries the same meaning
    pub async fn judge_description_equivalence(&self, expected: &str, predicted: &str) -> bool {
        let payload = json!({ "ground_truth": expected, "predicted": predicted });
        self.ask::<MatchVerdict>(DESCRIPTION_JUDGE_PROMPT, &payload)
            .await
            .map(|v| v.is_match)
            .unwrap_or(false)
    }

    /// Name of the single most plausible candidate, or empty.
    ///
    /// An empty candidate list returns empty without calling the model.
    pub async fn pick_best_candidate(&self, input_text: &str, candidates: &[MatchCandidate]) -> String {
        if candidates.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = candidates.iter().map(|c| c.name.trim()).collect();
        let payload = json!({ "input_text": input_text, "business_list": names });
        self.ask::<BestMatch>(BEST_MATCH_PROMPT, &payload)
            .await
            .map(|b| b.best_match)
            .unwrap_or_default()
    }

    async fn ask<T: DeserializeOwned>(&self, system: &str, payload: &Value) -> Option<T> {
        let user = payload.to_string();
        let call = self.llm.complete(system, &user, Some(&self.model));
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "Judge call failed");
                return None;
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Judge call timed out");
                return None;
            }
        };

        let object = parse_object(&response)?;
        match serde_json::from_value::<T>(Value::Object(object)) {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                debug!(error = %e, "Judge response outside schema");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bizmatch_extract::{ExtractError, Result};
    use parking_lot::Mutex;

    struct CannedModel {
        reply: std::result::Result<String, ()>,
        seen: Mutex<Vec<(String, String, Option<String>)>>,
    }

    impl CannedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn complete(&self, system: &str, user: &str, model: Option<&str>) -> Result<String> {
            self.seen
                .lock()
                .push((system.to_string(), user.to_string(), model.map(str::to_string)));
            self.reply
                .clone()
                .map_err(|_| ExtractError::Transport("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_description_match() {
        let llm = CannedModel::replying(r#"{"match": true}"#);
        let judge = ExtractionJudge::new(llm.clone());
        assert!(judge.judge_description_equivalence("кава", "капучино").await);

        let seen = llm.seen.lock();
        assert_eq!(seen[0].0, DESCRIPTION_JUDGE_PROMPT);
        let payload: Value = serde_json::from_str(&seen[0].1).unwrap();
        assert_eq!(payload["ground_truth"], "кава");
        assert_eq!(payload["predicted"], "капучино");
        assert_eq!(seen[0].2.as_deref(), Some(DEFAULT_JUDGE_MODEL));
    }

    #[tokio::test]
    async fn test_description_fails_closed() {
        for reply in ["not json", r#"{"match": "yes"}"#, r#"{"verdict": true}"#, "[true]"] {
            let judge = ExtractionJudge::new(CannedModel::replying(reply));
            assert!(!judge.judge_description_equivalence("a", "a").await, "{reply}");
        }
        let judge = ExtractionJudge::new(CannedModel::failing());
        assert!(!judge.judge_description_equivalence("a", "a").await);
    }

    #[tokio::test]
    async fn test_pick_best_candidate() {
        let llm = CannedModel::replying(r#"{"best_match": "Starbucks"}"#);
        let judge = ExtractionJudge::new(llm.clone()).with_model("judge-model");
        let candidates = vec![
            MatchCandidate::new(1u64, "Starbucks ", 12.1),
            MatchCandidate::new(2u64, "Costa", 9.0),
        ];
        let best = judge.pick_best_candidate("кава в старбаксі", &candidates).await;
        assert_eq!(best, "Starbucks");

        let seen = llm.seen.lock();
        let payload: Value = serde_json::from_str(&seen[0].1).unwrap();
        assert_eq!(payload["business_list"], json!(["Starbucks", "Costa"]));
        assert_eq!(seen[0].2.as_deref(), Some("judge-model"));
    }

    #[tokio::test]
    async fn test_pick_best_skips_empty_list() {
        let llm = CannedModel::replying(r#"{"best_match": "ATB"}"#);
        let judge = ExtractionJudge::new(llm.clone());
        assert_eq!(judge.pick_best_candidate("хліб", &[]).await, "");
        assert!(llm.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_pick_best_fails_closed() {
        let candidates = vec![MatchCandidate::new(1u64, "ATB", 1.0)];
        for reply in ["", r#"{"best_match": 3}"#] {
            let judge = ExtractionJudge::new(CannedModel::replying(reply));
            assert_eq!(judge.pick_best_candidate("хліб", &candidates).await, "");
        }
    }
}
