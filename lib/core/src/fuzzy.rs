// Keyword field with edit-distance lookup
use ahash::{AHashMap, AHashSet};

#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    // keyword -> doc_ids
    terms: AHashMap<String, AHashSet<String>>,
    // doc_id -> keywords
    doc_terms: AHashMap<String, Vec<String>>,
}

impl KeywordIndex {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_doc(&mut self, doc_id: &str, keywords: &[String]) {
        self.delete_doc(doc_id);

        let mut kept = Vec::new();
        for keyword in keywords.iter().filter(|k| !k.is_empty()) {
            if self
                .terms
                .entry(keyword.clone())
                .or_default()
                .insert(doc_id.to_string())
            {
                kept.push(keyword.clone());
            }
        }
        self.doc_terms.insert(doc_id.to_string(), kept);
    }

    pub fn delete_doc(&mut self, doc_id: &str) {
        for keyword in self.doc_terms.remove(doc_id).unwrap_or_default() {
            if let Some(docs) = self.terms.get_mut(&keyword) {
                docs.remove(doc_id);
                if docs.is_empty() {
                    self.terms.remove(&keyword);
                }
            }
        }
    }

    fn idf(&self, df: usize) -> f32 {
        let n = self.doc_terms.len() as f32;
        let df = df as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Documents whose keyword is within `fuzziness` edits (optimal string
    /// alignment, transpositions count as one edit) of `query`.
    ///
    /// Each hit scores `idf * (1 - distance / max_len)`; a document keeps its
    /// best-scoring keyword.
    pub fn search(&self, query: &str, fuzziness: usize) -> AHashMap<String, f32> {
        let mut doc_scores: AHashMap<String, f32> = AHashMap::new();
        if query.is_empty() {
            return doc_scores;
        }

        let mut score_hit = |docs: &AHashSet<String>, distance: usize, term: &str| {
            let max_len = query.chars().count().max(term.chars().count()).max(1);
            let similarity = 1.0 - distance as f32 / max_len as f32;
            let score = self.idf(docs.len()) * similarity;
            for doc_id in docs {
                let entry = doc_scores.entry(doc_id.clone()).or_insert(0.0);
                if score > *entry {
                    *entry = score;
                }
            }
        };

        if fuzziness == 0 {
            if let Some(docs) = self.terms.get(query) {
                score_hit(docs, 0, query);
            }
            return doc_scores;
        }

        let query_len = query.chars().count();
        for (term, docs) in &self.terms {
            // Length difference alone already exceeds the budget
            if term.chars().count().abs_diff(query_len) > fuzziness {
                continue;
            }
            let distance = strsim::osa_distance(query, term);
            if distance <= fuzziness {
                score_hit(docs, distance, term);
            }
        }
        doc_scores
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.doc_terms.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_terms.is_empty()
    }
}
