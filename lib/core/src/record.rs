use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::normalize::{fold, transliterate_uk};

/// Stable catalog identity of a business
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BusinessId {
    Integer(u64),
    String(String),
}

impl std::fmt::Display for BusinessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusinessId::Integer(i) => write!(f, "{}", i),
            BusinessId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for BusinessId {
    fn from(i: u64) -> Self {
        BusinessId::Integer(i)
    }
}

impl From<String> for BusinessId {
    fn from(s: String) -> Self {
        BusinessId::String(s)
    }
}

impl From<&str> for BusinessId {
    fn from(s: &str) -> Self {
        BusinessId::String(s.to_string())
    }
}

/// A catalog entry. Owned by the index, referenced by id from match results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessRecord {
    pub id: BusinessId,
    pub name: String,
    /// Alternate spellings of the name (e.g. the Cyrillic original)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub localized_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BusinessRecord {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<BusinessId>, name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = Some(slugify(&name));
        Self {
            id: id.into(),
            name,
            localized_names: Vec::new(),
            category: None,
            slug,
            updated_at: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_localized_name(mut self, name: impl Into<String>) -> Self {
        self.localized_names.push(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Display name followed by every localized variant
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.localized_names.iter().map(String::as_str))
    }

    /// Fill in the generated slug if the snapshot did not carry one
    pub(crate) fn ensure_slug(&mut self) {
        if self.slug.as_deref().map_or(true, str::is_empty) {
            self.slug = Some(slugify(&self.name));
        }
    }
}

/// URL-safe slug: transliterated, folded, non-alphanumerics collapsed to `-`
pub fn slugify(name: &str) -> String {
    let latin = fold(&transliterate_uk(name));
    let mut slug = String::with_capacity(latin.len());
    for c in latin.chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// A catalog record returned by one search call, with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: BusinessId,
    pub name: String,
    pub score: f32,
}

impl MatchCandidate {
    pub fn new(id: impl Into<BusinessId>, name: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score,
        }
    }
}

/// Deduplicated union of candidates across query terms.
///
/// Ordered by descending score, ties kept in retrieval order. Scores come
/// from different terms and retrieval clauses and are never renormalized,
/// so they only rank candidates relative to each other; they are not
/// calibrated confidences.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MatchSet {
    candidates: Vec<MatchCandidate>,
}

impl MatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from candidates in retrieval order. The first occurrence of an
    /// id wins, score included.
    pub fn from_retrieval(retrieved: impl IntoIterator<Item = MatchCandidate>) -> Self {
        let mut seen = ahash::AHashSet::new();
        let mut candidates: Vec<MatchCandidate> = retrieved
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        // Vec::sort_by is stable
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Self { candidates }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, MatchCandidate> {
        self.candidates.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[MatchCandidate] {
        &self.candidates
    }

    pub fn names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.clone()).collect()
    }

    pub fn into_vec(self) -> Vec<MatchCandidate> {
        self.candidates
    }
}

impl IntoIterator for MatchSet {
    type Item = MatchCandidate;
    type IntoIter = std::vec::IntoIter<MatchCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a MatchCandidate;
    type IntoIter = std::slice::Iter<'a, MatchCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
