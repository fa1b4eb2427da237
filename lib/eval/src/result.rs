use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Output columns, in file order
pub const COLUMNS: [&str; 21] = [
    "o_input_text",
    "o_business",
    "e_b_is_matched",
    "e_b_list",
    "e_n_matches",
    "e_score",
    "e_n_position",
    "best_b_match",
    "is_b_best_match",
    "o_datetime",
    "e_datetime",
    "e_t_matched",
    "o_description",
    "e_description",
    "e_d_is_matched",
    "o_amount",
    "e_amount",
    "e_a_is_matched",
    "o_currency",
    "e_currency",
    "e_c_is_matched",
];

/// Comparison record for one ground-truth row.
///
/// `o_*` columns hold the expected values, `e_*` columns the extracted
/// values and derived flags. Field order matches [`COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    #[serde(rename = "o_input_text")]
    pub input_text: String,
    #[serde(rename = "o_business")]
    pub expected_business: String,
    #[serde(rename = "e_b_is_matched", deserialize_with = "lenient_bool")]
    pub business_matched: bool,
    #[serde(rename = "e_b_list", with = "json_list")]
    pub business_candidates: Vec<String>,
    #[serde(rename = "e_n_matches", deserialize_with = "lenient_count")]
    pub candidate_count: usize,
    #[serde(rename = "e_score")]
    pub business_score: Option<f32>,
    #[serde(rename = "e_n_position")]
    pub business_position: Option<usize>,
    #[serde(rename = "best_b_match")]
    pub best_candidate: String,
    #[serde(rename = "is_b_best_match", deserialize_with = "lenient_bool")]
    pub best_candidate_matched: bool,
    #[serde(rename = "o_datetime")]
    pub expected_datetime: String,
    #[serde(rename = "e_datetime")]
    pub extracted_datetime: String,
    #[serde(rename = "e_t_matched", deserialize_with = "lenient_bool")]
    pub datetime_matched: bool,
    #[serde(rename = "o_description")]
    pub expected_description: String,
    #[serde(rename = "e_description")]
    pub extracted_description: String,
    #[serde(rename = "e_d_is_matched", deserialize_with = "lenient_bool")]
    pub description_matched: bool,
    #[serde(rename = "o_amount")]
    pub expected_amount: String,
    #[serde(rename = "e_amount")]
    pub extracted_amount: String,
    #[serde(rename = "e_a_is_matched", deserialize_with = "lenient_bool")]
    pub amount_matched: bool,
    #[serde(rename = "o_currency")]
    pub expected_currency: String,
    #[serde(rename = "e_currency")]
    pub extracted_currency: String,
    #[serde(rename = "e_c_is_matched", deserialize_with = "lenient_bool")]
    pub currency_matched: bool,
}

/// Only a case-insensitive "true" is true
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().eq_ignore_ascii_case("true"))
}

/// Integral or float text truncated to a count; anything else is zero
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    Ok(raw
        .parse::<usize>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as usize))
        .unwrap_or(0))
}

/// Candidate names stored as a JSON array inside one cell
mod json_list {
    use super::*;

    pub fn serialize<S: Serializer>(names: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        let text = serde_json::to_string(names).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(serde::de::Error::custom)
    }
}
