use crate::analysis::{fuzziness_for, keyword, ngrams, tokenize, NGRAM_SIZE};
use crate::{BusinessRecord, Error, FieldIndex, KeywordIndex, MatchCandidate, Result};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Configuration for a catalog index
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub name: String,
    /// Maximum number of candidates returned per search
    pub search_limit: usize,
    pub ngram_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            name: "businesses".to_string(),
            search_limit: 10,
            ngram_size: NGRAM_SIZE,
        }
    }
}

struct Entry {
    record: BusinessRecord,
    // indexing order, breaks score ties
    seq: u64,
}

#[derive(Default)]
struct CatalogState {
    records: AHashMap<String, Entry>,
    ngram: FieldIndex,
    full: FieldIndex,
    keyword: KeywordIndex,
    next_seq: u64,
}

/// In-memory fuzzy index over business names.
///
/// Every name is indexed three ways: character n-grams for partial matches,
/// folded word tokens for phrase matches and one folded keyword for
/// edit-distance matches. A query runs all three clauses with OR semantics
/// and sums the scores of the clauses that hit.
pub struct CatalogIndex {
    config: CatalogConfig,
    state: RwLock<CatalogState>,
}

impl CatalogIndex {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CatalogState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Insert or overwrite a record keyed by its id
    pub fn index(&self, mut record: BusinessRecord) -> Result<()> {
        let id_str = record.id.to_string();
        if id_str.trim().is_empty() {
            return Err(Error::InvalidRecord("empty id".to_string()));
        }
        if record.name.trim().is_empty() {
            return Err(Error::InvalidRecord(format!("business {} has an empty name", id_str)));
        }
        record.ensure_slug();

        let tokens: Vec<Vec<String>> = record.names().map(tokenize).collect();
        let grams: Vec<Vec<String>> = tokens
            .iter()
            .map(|t| ngrams(t, self.config.ngram_size))
            .collect();
        let keywords: Vec<String> = record.names().map(keyword).collect();

        let mut state = self.state.write();
        state.ngram.insert_doc(&id_str, &grams);
        state.full.insert_doc(&id_str, &tokens);
        state.keyword.insert_doc(&id_str, &keywords);

        // Overwrites keep their original position in the tie order
        let seq = match state.records.get(&id_str) {
            Some(existing) => existing.seq,
            None => {
                state.next_seq += 1;
                state.next_seq
            }
        };
        state.records.insert(id_str, Entry { record, seq });
        Ok(())
    }

    /// Index many records, stopping at the first invalid one
    pub fn index_batch(&self, records: impl IntoIterator<Item = BusinessRecord>) -> Result<usize> {
        let mut count = 0;
        for record in records {
            self.index(record)?;
            count += 1;
        }
        Ok(count)
    }

    /// Load a JSON array of records, e.g. a catalog snapshot
    pub fn load_json<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let records: Vec<BusinessRecord> = serde_json::from_str(&content)?;
        let count = self.index_batch(records)?;
        debug!(catalog = %self.config.name, count, "Loaded catalog snapshot");
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<BusinessRecord> {
        self.state.read().records.get(id).map(|e| e.record.clone())
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.state.write();
        state.ngram.delete_doc(id);
        state.full.delete_doc(id);
        state.keyword.delete_doc(id);
        state.records.remove(id).is_some()
    }

    /// Run one query; candidates come back by descending score, ties in
    /// indexing order. An empty query yields no candidates.
    pub fn search(&self, term: &str) -> Vec<MatchCandidate> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }

        let tokens = tokenize(term);
        let grams = ngrams(&tokens, self.config.ngram_size);
        let query_keyword = keyword(term);
        let fuzziness = fuzziness_for(term);

        let state = self.state.read();
        let mut scores: AHashMap<String, f32> = AHashMap::new();
        let clauses = [
            state.ngram.search_any(&grams),
            state.full.search_phrase(&tokens),
            state.keyword.search(&query_keyword, fuzziness),
        ];
        for clause in clauses {
            for (doc_id, score) in clause {
                *scores.entry(doc_id).or_insert(0.0) += score;
            }
        }

        let mut hits: Vec<(u64, MatchCandidate)> = scores
            .into_iter()
            .filter_map(|(doc_id, score)| {
                state.records.get(&doc_id).map(|entry| {
                    (
                        entry.seq,
                        MatchCandidate::new(entry.record.id.clone(), entry.record.name.clone(), score),
                    )
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits.truncate(self.config.search_limit);

        debug!(term, fuzziness, hits = hits.len(), "Catalog search");
        hits.into_iter().map(|(_, candidate)| candidate).collect()
    }
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}
