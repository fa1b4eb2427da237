use crate::{CatalogIndex, MatchCandidate, MatchSet, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// A catalog that can answer one free-text query at a time.
///
/// Implemented by [`CatalogIndex`]; tests and remote backends provide their own.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Candidates for a single term, best first
    async fn search(&self, term: &str) -> Result<Vec<MatchCandidate>>;
}

#[async_trait]
impl CatalogSearch for CatalogIndex {
    async fn search(&self, term: &str) -> Result<Vec<MatchCandidate>> {
        Ok(CatalogIndex::search(self, term))
    }
}

/// Resolves several spellings of one business mention against the catalog.
///
/// Each distinct term is an independent retrieval attempt and the result
/// pools are OR'ed: any spelling that hits is enough evidence.
#[derive(Clone)]
pub struct BusinessMatcher {
    catalog: Arc<dyn CatalogSearch>,
}

impl BusinessMatcher {
    pub fn new(catalog: Arc<dyn CatalogSearch>) -> Self {
        Self { catalog }
    }

    /// Search every distinct term in order and merge the hits.
    ///
    /// A candidate keeps the score from the first term that returned it.
    /// A term whose search fails contributes nothing.
    pub async fn match_all(&self, terms: &[String]) -> MatchSet {
        let mut seen_terms = ahash::AHashSet::new();
        let mut retrieved = Vec::new();

        for term in terms {
            if !seen_terms.insert(term.as_str()) {
                continue;
            }
            match self.catalog.search(term).await {
                Ok(hits) => {
                    debug!(term = %term, hits = hits.len(), "Business search");
                    retrieved.extend(hits);
                }
                Err(e) => {
                    warn!(term = %term, error = %e, "Business search failed, skipping term");
                }
            }
        }

        MatchSet::from_retrieval(retrieved)
    }
}
