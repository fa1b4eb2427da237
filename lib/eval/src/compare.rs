//! Per-field correctness rules.

use bizmatch_core::MatchCandidate;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Numeric-aware equality. Both sides blank is a match, one side blank is not.
pub fn values_match(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        _ => {}
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

/// Field comparison where a blank expectation always passes
pub fn field_matches(expected: &str, predicted: &str) -> bool {
    expected.trim().is_empty() || values_match(expected, predicted)
}

/// Case-insensitive, trimmed name comparison
pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Timestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    let value = match value.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };

    if let Ok(t) = DateTime::parse_from_rfc3339(&value) {
        return Some(Timestamp::Aware(t));
    }
    for fmt in AWARE_FORMATS {
        if let Ok(t) = DateTime::parse_from_str(&value, fmt) {
            return Some(Timestamp::Aware(t));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(&value, fmt) {
            return Some(Timestamp::Naive(t));
        }
    }
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Timestamp::Naive)
}

/// Exact instant equality. Offset-aware values compare across notations;
/// an offset-aware value never equals a naive one. Unparseable is a miss.
pub fn datetimes_equal(a: &str, b: &str) -> bool {
    if a.trim().is_empty() || b.trim().is_empty() {
        return false;
    }
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(Timestamp::Aware(x)), Some(Timestamp::Aware(y))) => x == y,
        (Some(Timestamp::Naive(x)), Some(Timestamp::Naive(y))) => x == y,
        _ => false,
    }
}

/// Business retrieval outcome for one row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessScore {
    pub matched: bool,
    pub candidate_count: usize,
    /// Score of the first candidate whose name equals the ground truth
    pub score: Option<f32>,
    /// 1-based rank of that candidate
    pub position: Option<usize>,
    /// Candidate names in rank order
    pub names: Vec<String>,
}

/// Locate the ground-truth business among retrieved candidates.
///
/// Candidates are ranked by score descending, ties keeping retrieval
/// order. With no candidates the row counts as matched only when the
/// ground truth is blank as well.
pub fn business_metrics(expected: &str, candidates: &[MatchCandidate]) -> BusinessScore {
    if candidates.is_empty() {
        return BusinessScore {
            matched: expected.trim().is_empty(),
            ..Default::default()
        };
    }

    let mut ranked: Vec<&MatchCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let found = ranked.iter().position(|c| names_equal(&c.name, expected));
    BusinessScore {
        matched: found.is_some(),
        candidate_count: ranked.len(),
        score: found.map(|i| ranked[i].score),
        position: found.map(|i| i + 1),
        names: ranked.iter().map(|c| c.name.trim().to_string()).collect(),
    }
}
