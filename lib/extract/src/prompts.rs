use crate::Result;
use chrono::{DateTime, FixedOffset};
use std::path::Path;

const MAIN_PROMPT: &str = "You extract a financial transaction from a transcribed voice note. \
Return ONLY a JSON object: {\"description\": string, \"amount\": number|null, \"currency\": string|null}.";

const BUSINESS_PROMPT: &str = "You extract the business (shop, cafe, service) where a transaction \
happened from a transcribed voice note. Return ONLY a JSON object: {\"business\": string|null, \
\"language\": \"uk\"|\"en\", \"uk_lemma\": string|null}. uk_lemma is the dictionary form of a \
Ukrainian business name.";

const DATETIME_PROMPT: &str = "The current time is {current_time}. Determine when the transaction \
in the transcribed voice note happened. Return ONLY a JSON object: {\"time\": ISO-8601 string|null, \
\"action\": \"+\"|\"-\", \"years\": int, \"months\": int, \"days\": int, \"hours\": int, \
\"minutes\": int}. Use time for absolute moments, otherwise an offset from the current time.";

/// Placeholder replaced by the reference time in the datetime prompt
pub const CURRENT_TIME_PLACEHOLDER: &str = "{current_time}";

/// System instructions for the three extraction groups
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub main: String,
    pub business: String,
    pub datetime_template: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            main: MAIN_PROMPT.to_string(),
            business: BUSINESS_PROMPT.to_string(),
            datetime_template: DATETIME_PROMPT.to_string(),
        }
    }
}

impl PromptSet {
    /// Override prompts with `main.txt`, `business.txt` and `datetime.txt`
    /// from `dir` where present
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut prompts = Self::default();
        for (file, slot) in [
            ("main.txt", &mut prompts.main),
            ("business.txt", &mut prompts.business),
            ("datetime.txt", &mut prompts.datetime_template),
        ] {
            let path = dir.join(file);
            if path.exists() {
                *slot = std::fs::read_to_string(path)?;
            }
        }
        Ok(prompts)
    }

    pub fn datetime(&self, reference: &DateTime<FixedOffset>) -> String {
        self.datetime_template
            .replace(CURRENT_TIME_PLACEHOLDER, &reference.to_rfc3339())
    }
}
