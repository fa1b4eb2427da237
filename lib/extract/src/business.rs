use crate::schema::BusinessFields;
use bizmatch_core::normalize::{clean_special_characters, transliterate_uk};
use bizmatch_core::{BusinessMatcher, MatchSet};
use serde::Serialize;
use tracing::debug;

/// Outcome of the business extraction group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessExtraction {
    /// The mention as the model extracted it
    pub mention: Option<String>,
    /// Distinct search terms derived from the mention
    pub terms: Vec<String>,
    pub candidates: MatchSet,
}

/// Derive the distinct search terms for a business mention.
///
/// Takes the mention, its lemma and any other spelling the model returned;
/// Ukrainian mentions also contribute the Latin transliterations of the
/// mention and lemma. Empty fields produce no term.
pub fn search_terms(fields: &BusinessFields) -> Vec<String> {
    let mut raw: Vec<String> = Vec::new();
    raw.extend(fields.business.clone());
    raw.extend(fields.uk_lemma.clone());
    raw.extend(fields.variants.iter().cloned());
    if fields.language.as_deref() == Some("uk") {
        raw.extend(fields.business.as_deref().map(transliterate_uk));
        raw.extend(fields.uk_lemma.as_deref().map(transliterate_uk));
    }

    let mut terms: Vec<String> = Vec::new();
    for term in raw.iter().map(|t| clean_special_characters(t)) {
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Turn a business response into candidates. Without a mention there is
/// nothing to search.
pub async fn resolve_business(response: &str, matcher: &BusinessMatcher) -> BusinessExtraction {
    let Some(fields) = BusinessFields::from_response(response) else {
        return BusinessExtraction::default();
    };
    if fields.business.is_none() {
        debug!("No business entity extracted");
        return BusinessExtraction::default();
    }

    let terms = search_terms(&fields);
    debug!(terms = ?terms, "Searching businesses");
    let candidates = matcher.match_all(&terms).await;
    if candidates.is_empty() {
        debug!("No matched businesses found");
    }

    BusinessExtraction {
        mention: fields.business,
        terms,
        candidates,
    }
}
