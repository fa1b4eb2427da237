//! # bizmatch
//!
//! Business-name matching and extraction-quality evaluation for
//! voice-entered transactions.
//!
//! A transcribed note such as "лате в старбаксі за 150" is turned into
//! structured fields by a language model; the business mention is resolved
//! against a catalog with fuzzy search, and a labeled dataset measures how
//! well all of it works.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! bizmatch search --catalog businesses.json starbaks
//! bizmatch eval --data eval_data.csv --catalog businesses.json --output eval.csv
//! bizmatch metrics --input eval.csv
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use bizmatch::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> bizmatch::Result<()> {
//! let index = CatalogIndex::new(CatalogConfig::default());
//! index.index(BusinessRecord::new(1u64, "Starbucks"))?;
//! index.index(BusinessRecord::new(2u64, "Costa Coffee"))?;
//!
//! let matcher = BusinessMatcher::new(Arc::new(index));
//! let candidates = matcher
//!     .match_all(&["Starbaks".to_string(), "Старбакс".to_string()])
//!     .await;
//! for candidate in &candidates {
//!     println!("{} {}", candidate.name, candidate.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - [`bizmatch-core`](bizmatch_core) - Text normalization, fuzzy catalog index, business matcher
//! - [`bizmatch-extract`](bizmatch_extract) - Language-model extraction of transaction fields
//! - [`bizmatch-eval`](bizmatch_eval) - Evaluation harness, comparison rules and metrics

// Re-export core types
pub use bizmatch_core::{
    BusinessId, BusinessMatcher, BusinessRecord, CatalogConfig, CatalogIndex, CatalogSearch,
    Error, MatchCandidate, MatchSet, Result,
};

// Re-export extraction
pub use bizmatch_extract::{
    ExtractError, Extractor, LanguageModel, OpenAiClient, OpenAiConfig, PromptSet,
    TransactionDraft,
};

// Re-export evaluation
pub use bizmatch_eval::{
    aggregate, load_rows, read_results, write_results, EvalConfig, EvalError, EvalOrchestrator,
    EvalResult, ExtractionJudge, GroundTruthRow, Metric, MetricsReport,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        aggregate, load_rows, read_results, write_results, BusinessId, BusinessMatcher,
        BusinessRecord, CatalogConfig, CatalogIndex, CatalogSearch, Error, EvalConfig, EvalError,
        EvalOrchestrator, EvalResult, ExtractError, ExtractionJudge, Extractor, GroundTruthRow,
        LanguageModel, MatchCandidate, MatchSet, Metric, MetricsReport, OpenAiClient,
        OpenAiConfig, PromptSet, Result, TransactionDraft,
    };
}

/// Text normalization helpers shared by indexing and query expansion
pub mod normalize {
    pub use bizmatch_core::normalize::{clean_special_characters, fold, transliterate_uk};
}
