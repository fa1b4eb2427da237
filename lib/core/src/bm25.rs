// BM25 field index with positional postings
use ahash::AHashMap;

/// Position gap inserted between values of a multi-valued field so that
/// phrases never span two name variants.
const POSITION_GAP: u32 = 100;

#[derive(Debug, Clone)]
pub struct FieldIndex {
    // term -> (doc_id -> positions)
    postings: AHashMap<String, AHashMap<String, Vec<u32>>>,
    // doc_id -> distinct terms, for deletes
    doc_terms: AHashMap<String, Vec<String>>,
    // doc_id -> document length in tokens
    doc_lengths: AHashMap<String, u32>,
    total_len: u64,
    k1: f32, // term frequency saturation parameter
    b: f32,  // length normalization parameter
}

impl FieldIndex {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(1.2, 0.75)
    }

    #[inline]
    #[must_use]
    pub fn with_params(k1: f32, b: f32) -> Self {
        Self {
            postings: AHashMap::new(),
            doc_terms: AHashMap::new(),
            doc_lengths: AHashMap::new(),
            total_len: 0,
            k1,
            b,
        }
    }

    /// Index a document made of one or more token streams.
    pub fn insert_doc(&mut self, doc_id: &str, values: &[Vec<String>]) {
        // Remove old document if exists
        self.delete_doc(doc_id);

        let mut doc_len = 0u32;
        let mut offset = 0u32;
        let mut terms = Vec::new();
        for tokens in values {
            for (pos, token) in tokens.iter().enumerate() {
                let docs = self.postings.entry(token.clone()).or_default();
                let positions = docs.entry(doc_id.to_string()).or_default();
                if positions.is_empty() {
                    terms.push(token.clone());
                }
                positions.push(offset + pos as u32);
            }
            doc_len += tokens.len() as u32;
            offset += tokens.len() as u32 + POSITION_GAP;
        }

        self.doc_terms.insert(doc_id.to_string(), terms);
        self.doc_lengths.insert(doc_id.to_string(), doc_len);
        self.total_len += u64::from(doc_len);
    }

    pub fn delete_doc(&mut self, doc_id: &str) {
        if let Some(doc_len) = self.doc_lengths.remove(doc_id) {
            self.total_len = self.total_len.saturating_sub(u64::from(doc_len));
            for term in self.doc_terms.remove(doc_id).unwrap_or_default() {
                if let Some(docs) = self.postings.get_mut(&term) {
                    docs.remove(doc_id);
                    if docs.is_empty() {
                        self.postings.remove(&term);
                    }
                }
            }
        }
    }

    /// Lucene-style idf, always positive
    #[inline]
    pub fn idf(&self, term: &str) -> f32 {
        let df = self.postings.get(term).map_or(0, |docs| docs.len()) as f32;
        let n = self.doc_lengths.len() as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn avgdl(&self) -> f32 {
        if self.doc_lengths.is_empty() {
            0.0
        } else {
            self.total_len as f32 / self.doc_lengths.len() as f32
        }
    }

    fn term_score(&self, tf: u32, doc_len: u32, avgdl: f32, idf: f32) -> f32 {
        let tf = tf as f32;
        let norm = if avgdl > 0.0 { doc_len as f32 / avgdl } else { 1.0 };
        // BM25 formula: idf * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * (doc_len / avgdl)))
        idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * norm))
    }

    /// OR query: every document containing at least one term, scores summed
    /// over query terms (repeated query terms count repeatedly).
    pub fn search_any(&self, terms: &[String]) -> AHashMap<String, f32> {
        let mut doc_scores: AHashMap<String, f32> = AHashMap::new();
        if self.doc_lengths.is_empty() {
            return doc_scores;
        }
        let avgdl = self.avgdl();

        for term in terms {
            if let Some(docs) = self.postings.get(term) {
                let idf = self.idf(term);
                for (doc_id, positions) in docs {
                    let doc_len = self.doc_lengths.get(doc_id).copied().unwrap_or(0);
                    let score = self.term_score(positions.len() as u32, doc_len, avgdl, idf);
                    *doc_scores.entry(doc_id.clone()).or_insert(0.0) += score;
                }
            }
        }
        doc_scores
    }

    /// Phrase query: all terms at consecutive positions. The phrase
    /// frequency stands in for the term frequency of every phrase term.
    pub fn search_phrase(&self, terms: &[String]) -> AHashMap<String, f32> {
        let mut doc_scores: AHashMap<String, f32> = AHashMap::new();
        let Some(first) = terms.first() else {
            return doc_scores;
        };
        let Some(candidates) = self.postings.get(first) else {
            return doc_scores;
        };
        let avgdl = self.avgdl();

        for (doc_id, starts) in candidates {
            let freq = starts
                .iter()
                .filter(|&&start| {
                    terms.iter().enumerate().skip(1).all(|(i, term)| {
                        self.postings
                            .get(term)
                            .and_then(|docs| docs.get(doc_id))
                            .map_or(false, |p| p.contains(&(start + i as u32)))
                    })
                })
                .count() as u32;
            if freq == 0 {
                continue;
            }
            let doc_len = self.doc_lengths.get(doc_id).copied().unwrap_or(0);
            let score: f32 = terms
                .iter()
                .map(|term| self.term_score(freq, doc_len, avgdl, self.idf(term)))
                .sum();
            doc_scores.insert(doc_id.clone(), score);
        }
        doc_scores
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }
}

impl Default for FieldIndex {
    fn default() -> Self {
        Self::new()
    }
}
