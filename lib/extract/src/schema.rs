//! Typed shapes of the language-model responses.
//!
//! Each call site expects one JSON object. Parsing never fails outright:
//! missing keys and wrong types fall back to `None` and the caller decides
//! the default.

use serde_json::{Map, Value};
use tracing::warn;

/// Parse a response as a JSON object, tolerating a surrounding markdown fence
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!(kind = %value_kind(&other), "Expected a JSON object");
            None
        }
        Err(e) => {
            warn!(error = %e, "Response is not valid JSON");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A string field, `None` when absent or not a string
pub fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Main extraction group: description, amount, currency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainFields {
    pub description: Option<String>,
    /// Rendered as text whether the model sent a number or a string
    pub amount: Option<String>,
    pub currency: Option<String>,
}

impl MainFields {
    pub fn from_response(text: &str) -> Self {
        let Some(map) = parse_object(text) else {
            return Self::default();
        };
        let amount = match map.get("amount") {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
        .filter(|s| !s.is_empty());

        Self {
            description: string_field(&map, "description"),
            amount,
            currency: string_field(&map, "currency"),
        }
    }

    /// Amount as a number, if it parses as one
    pub fn amount_value(&self) -> Option<f64> {
        self.amount.as_deref().and_then(|a| a.parse::<f64>().ok())
    }
}

/// Datetime extraction group: an absolute time or an offset from "now"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatetimeFields {
    pub time: Option<String>,
    pub action: Option<String>,
    pub years: f64,
    pub months: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
}

impl DatetimeFields {
    /// `None` unless the response is an object carrying a `time` key,
    /// even if its value is null
    pub fn from_response(text: &str) -> Option<Self> {
        let map = parse_object(text)?;
        if !map.contains_key("time") {
            return None;
        }
        let number = |key: &str| map.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Some(Self {
            time: string_field(&map, "time").filter(|t| !t.trim().is_empty()),
            action: string_field(&map, "action"),
            years: number("years"),
            months: number("months"),
            days: number("days"),
            hours: number("hours"),
            minutes: number("minutes"),
        })
    }
}

/// Business extraction group: the mention plus optional spelling variants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessFields {
    pub business: Option<String>,
    pub language: Option<String>,
    pub uk_lemma: Option<String>,
    /// Any other non-empty string values, in key order
    pub variants: Vec<String>,
}

impl BusinessFields {
    pub fn from_response(text: &str) -> Option<Self> {
        let map = parse_object(text)?;
        let non_empty = |key: &str| string_field(&map, key).filter(|v| !v.trim().is_empty());
        let variants = map
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "business" | "language" | "uk_lemma"))
            .filter_map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            business: non_empty("business"),
            language: non_empty("language"),
            uk_lemma: non_empty("uk_lemma"),
            variants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_fenced() {
        let map = parse_object("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(map["a"], 1);
        assert!(parse_object("[1, 2]").is_none());
        assert!(parse_object("not json").is_none());
    }

    #[test]
    fn test_main_fields_amount_number_or_string() {
        let fields = MainFields::from_response(
            r#"{"description": "coffee", "amount": 150, "currency": "UAH"}"#,
        );
        assert_eq!(fields.amount.as_deref(), Some("150"));
        assert_eq!(fields.amount_value(), Some(150.0));
        assert_eq!(fields.description.as_deref(), Some("coffee"));

        let fields = MainFields::from_response(r#"{"amount": " 99.5 ", "currency": 3}"#);
        assert_eq!(fields.amount.as_deref(), Some("99.5"));
        assert_eq!(fields.currency, None);
    }

    #[test]
    fn test_main_fields_garbage() {
        assert_eq!(MainFields::from_response("oops"), MainFields::default());
        let fields = MainFields::from_response(r#"{"amount": null, "description": ""}"#);
        assert_eq!(fields.amount, None);
        assert_eq!(fields.description.as_deref(), Some(""));
    }

    #[test]
    fn test_datetime_fields() {
        let fields = DatetimeFields::from_response(
            r#"{"time": null, "action": "-", "days": 1, "hours": null}"#,
        )
        .unwrap();
        assert_eq!(fields.time, None);
        assert_eq!(fields.action.as_deref(), Some("-"));
        assert_eq!(fields.days, 1.0);
        assert_eq!(fields.hours, 0.0);

        assert!(DatetimeFields::from_response(r#"{"action": "-", "days": 1}"#).is_none());
    }

    #[test]
    fn test_business_fields_variants() {
        let fields = BusinessFields::from_response(
            r#"{"business": "Сільпо", "language": "uk", "uk_lemma": "сільпо", "en": "Silpo", "n": 3, "empty": ""}"#,
        )
        .unwrap();
        assert_eq!(fields.business.as_deref(), Some("Сільпо"));
        assert_eq!(fields.language.as_deref(), Some("uk"));
        assert_eq!(fields.variants, vec!["Silpo"]);
    }
}
